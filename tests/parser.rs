use nangosha_lang as lang;

use lang::ast::{BinaryOp, Expr, LiteralValue, Stmt};
use lang::parser::Parser;
use lang::scanner::scan;
use lang::LangError;

fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LangError>> {
    let mut lex_errors: Vec<(usize, String)> = Vec::new();
    let tokens = scan(source, &mut lex_errors);
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

    Parser::new(&tokens).parse()
}

fn parse_ok(source: &str) -> Vec<Stmt> {
    parse(source).unwrap_or_else(|errors| panic!("parse errors: {:?}", errors))
}

fn parse_errors(source: &str) -> Vec<(usize, String)> {
    parse(source)
        .expect_err("expected a parse error")
        .iter()
        .map(|e| (e.line().unwrap_or(0), e.message()))
        .collect()
}

#[test]
fn precedence_binds_factor_tighter_than_term() {
    let program = parse_ok("1 + 2 * 3;");

    let Stmt::Expression(Expr::Binary {
        operator, right, ..
    }) = &program[0]
    else {
        panic!("unexpected tree: {:?}", program);
    };

    assert_eq!(*operator, BinaryOp::Add);
    assert!(matches!(
        right.as_ref(),
        Expr::Binary {
            operator: BinaryOp::Multiply,
            ..
        }
    ));
}

#[test]
fn assignment_is_right_associative() {
    let program = parse_ok("a = b = 1;");

    let Stmt::Expression(Expr::Assign { name, value }) = &program[0] else {
        panic!("unexpected tree: {:?}", program);
    };

    assert_eq!(name.name, "a");
    assert!(matches!(value.as_ref(), Expr::Assign { name, .. } if name.name == "b"));
}

#[test]
fn property_assignment_becomes_set() {
    let program = parse_ok("point.x = 3;");

    assert!(matches!(
        &program[0],
        Stmt::Expression(Expr::Set { name, .. }) if name.name == "x"
    ));
}

#[test]
fn for_loop_desugars_to_while_in_a_block() {
    let program = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");
    assert_eq!(program.len(), 1);

    let Stmt::Block(outer) = &program[0] else {
        panic!("expected block, got {:?}", program[0]);
    };

    assert!(matches!(&outer[0], Stmt::Var { name, .. } if name.name == "i"));

    let Stmt::While { body, .. } = &outer[1] else {
        panic!("expected while, got {:?}", outer[1]);
    };

    let Stmt::Block(inner) = body.as_ref() else {
        panic!("expected block body, got {:?}", body);
    };

    assert!(matches!(inner[0], Stmt::Print(_)));
    assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
}

#[test]
fn for_loop_without_clauses_loops_on_true() {
    let program = parse_ok("for (;;) print 1;");

    let Stmt::While { condition, body } = &program[0] else {
        panic!("expected bare while, got {:?}", program[0]);
    };

    assert_eq!(*condition, Expr::Literal(LiteralValue::True));
    assert!(matches!(body.as_ref(), Stmt::Print(_)));
}

#[test]
fn class_with_superclass_and_methods() {
    let program = parse_ok("class B < A { init(x) { this.x = x; } get() { return this.x; } }");

    let Stmt::Class {
        name,
        superclass,
        methods,
    } = &program[0]
    else {
        panic!("expected class, got {:?}", program[0]);
    };

    assert_eq!(name.name, "B");
    assert_eq!(superclass.as_ref().map(|s| s.name.as_str()), Some("A"));

    let names: Vec<&str> = methods.iter().map(|m| m.name.name.as_str()).collect();
    assert_eq!(names, vec!["init", "get"]);
    assert_eq!(methods[0].params.len(), 1);
}

#[test]
fn return_inside_function_is_accepted() {
    let program = parse_ok("fun f() { if (true) return; return 1; }");
    assert!(matches!(program[0], Stmt::Function(_)));
}

#[test]
fn return_at_top_level_is_rejected() {
    assert_eq!(
        parse_errors("print 1;\nreturn 1;"),
        vec![(2, "Can't return from top-level code.".to_string())]
    );
}

#[test]
fn invalid_assignment_target() {
    assert_eq!(
        parse_errors("1 + 2 = 3;"),
        vec![(1, "Invalid assignment target.".to_string())]
    );
}

#[test]
fn class_cannot_inherit_from_itself() {
    assert_eq!(
        parse_errors("class Loop < Loop {}"),
        vec![(1, "A class can't inherit from itself.".to_string())]
    );
}

#[test]
fn missing_semicolon_points_at_next_token() {
    assert_eq!(
        parse_errors("print 1\nprint 2;"),
        vec![(2, "at 'print': Expect ';' after value.".to_string())]
    );
}

#[test]
fn error_at_end_of_input() {
    assert_eq!(
        parse_errors("print (1"),
        vec![(1, "at end: Expect ')' after expression.".to_string())]
    );
}

#[test]
fn recovers_and_reports_every_error() {
    let errors = parse_errors("var = 1;\nprint 2;\nvar 3;\nfun (){}");

    let lines: Vec<usize> = errors.iter().map(|(line, _)| *line).collect();
    assert_eq!(lines, vec![1, 3, 4]);
    assert!(errors[0].1.ends_with("Expect variable name."));
    assert!(errors[2].1.ends_with("Expect function name."));
}

#[test]
fn too_many_arguments() {
    let args = vec!["1"; 256].join(", ");
    let errors = parse_errors(&format!("f({});", args));

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, "Can't have more than 255 arguments.");
}
