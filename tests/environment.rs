use nangosha_lang as lang;

use lang::environment::Environment;
use lang::Value;

#[test]
fn define_then_get() {
    let globals = Environment::new_global();
    globals.borrow_mut().define("a", Value::Number(1.0));

    assert_eq!(globals.borrow().get("a", 1).unwrap(), Value::Number(1.0));
}

#[test]
fn redefinition_in_same_scope_overwrites() {
    let globals = Environment::new_global();
    globals.borrow_mut().define("a", Value::Number(1.0));
    globals.borrow_mut().define("a", Value::from("two"));

    assert_eq!(globals.borrow().get("a", 1).unwrap(), Value::from("two"));
}

#[test]
fn inner_definition_shadows_without_touching_outer() {
    let outer = Environment::new_global();
    outer.borrow_mut().define("a", Value::Number(1.0));

    let inner = Environment::new_child(&outer);
    inner.borrow_mut().define("a", Value::Number(2.0));

    assert_eq!(inner.borrow().get("a", 1).unwrap(), Value::Number(2.0));
    assert_eq!(outer.borrow().get("a", 1).unwrap(), Value::Number(1.0));
}

#[test]
fn lookup_walks_outward() {
    let outer = Environment::new_global();
    outer.borrow_mut().define("a", Value::Bool(true));

    let middle = Environment::new_child(&outer);
    let inner = Environment::new_child(&middle);

    assert_eq!(inner.borrow().get("a", 1).unwrap(), Value::Bool(true));
    assert_eq!(inner.borrow().depth(), 3);
}

#[test]
fn assign_updates_the_scope_that_holds_the_binding() {
    let outer = Environment::new_global();
    outer.borrow_mut().define("a", Value::Number(1.0));

    let first = Environment::new_child(&outer);
    let second = Environment::new_child(&outer);

    first
        .borrow_mut()
        .assign("a", Value::Number(5.0), 1)
        .unwrap();

    // Visible through every holder of the shared scope.
    assert_eq!(second.borrow().get("a", 1).unwrap(), Value::Number(5.0));
    assert!(!first.borrow().contains_local("a"));
}

#[test]
fn assign_to_undefined_never_creates_a_global() {
    let globals = Environment::new_global();
    let inner = Environment::new_child(&globals);

    let err = inner
        .borrow_mut()
        .assign("missing", Value::Nil, 4)
        .unwrap_err();

    assert_eq!(err.message(), "Undefined variable 'missing'.");
    assert_eq!(err.line(), Some(4));
    assert!(!globals.borrow().contains_local("missing"));
}

#[test]
fn get_undefined_reports_line() {
    let globals = Environment::new_global();

    let err = globals.borrow().get("nope", 9).unwrap_err();

    assert!(err.is_runtime());
    assert_eq!(err.to_string(), "Undefined variable 'nope'.\n[line 9]");
}

#[test]
fn child_keeps_enclosing_alive() {
    let child = {
        let outer = Environment::new_global();
        outer.borrow_mut().define("kept", Value::Number(3.0));
        Environment::new_child(&outer)
    };

    assert_eq!(child.borrow().get("kept", 1).unwrap(), Value::Number(3.0));
    assert!(child.borrow().enclosing().is_some());
}
