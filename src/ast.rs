//! Abstract syntax tree consumed by the [`Interpreter`](crate::interpreter::Interpreter).
//!
//! Nodes own their data (names and literals are copied out of the tokens), so
//! a tree can outlive the source buffer it was parsed from. Function
//! declarations sit behind an `Rc` because every runtime function value made
//! from them shares the same body.

use std::rc::Rc;

/// A name as written in the source, with the line it appeared on.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub line: usize,
}

impl Identifier {
    pub fn new<S: Into<String>>(name: S, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Integral lexemes such as `"3"` are still stored as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Negate,

    /// `!x`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Variable access, resolved against the live environment chain.
    Variable(Identifier),

    /// `name = value`
    Assign { name: Identifier, value: Box<Expr> },

    /// Prefix operator: `!ready`, `-42`.
    Unary {
        operator: UnaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// Infix operator: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
    },

    /// Function, method or constructor call. `line` is the closing paren's.
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        line: usize,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Identifier },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Identifier,
        value: Box<Expr>,
    },

    /// `this` inside a method body.
    This { line: usize },

    /// `super.method` inside a subclass method body.
    Super { method: Identifier, line: usize },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),
}

/// A named function or method: `name(params) { body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Identifier,
    pub params: Vec<Identifier>,
    pub body: Vec<Stmt>,
}

/// Statement nodes. A program is a `Vec<Stmt>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// `var name (= initializer)?;`
    Var {
        name: Identifier,
        initializer: Option<Expr>,
    },

    /// Braced scope.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops are desugared into this by the parser.
    While { condition: Expr, body: Box<Stmt> },

    Function(Rc<FunctionDecl>),

    /// `class Name (< Superclass)? { methods }`
    Class {
        name: Identifier,
        superclass: Option<Identifier>,
        methods: Vec<Rc<FunctionDecl>>,
    },

    /// `return value?;`. An absent value means `nil`.
    Return { value: Option<Expr>, line: usize },
}
