//! Tree-walking evaluator.
//!
//! The interpreter owns the global scope and a pointer to the scope currently
//! executing. Names are resolved dynamically: every access walks the live
//! chain starting at `environment`, so correctness rests on building that
//! chain to mirror lexical nesting (blocks, calls, bound methods).
//!
//! Statement execution yields a [`Flow`]. `return` produces
//! `Flow::Return(value)`, which blocks and loops hand straight back up until a
//! function call turns it into the call's result. Runtime errors travel
//! separately as `Err(LangError::Runtime)` and abort the whole run.

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{
    BinaryOp, Expr, FunctionDecl, Identifier, LiteralValue, LogicalOp, Stmt, UnaryOp,
};
use crate::callable::{Callable, Function, NativeFunction};
use crate::class::Class;
use crate::environment::{Environment, SharedEnv};
use crate::error::{LangError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Default bound on nested script calls before `Stack overflow.` is raised.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 2048;

/// Outcome of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Continue with the next statement.
    Normal,

    /// Unwind to the nearest function call with this value.
    Return(Value),
}

pub struct Interpreter {
    globals: SharedEnv,
    environment: SharedEnv,
    out: Box<dyn Write>,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to standard output, with native functions such
    /// as `clock` defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose `print` statements write to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new_global();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            out,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        };

        debug!("Defining native function 'clock'");
        interpreter.define_native(NativeFunction::new("clock", 0, clock));

        interpreter
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn globals(&self) -> &SharedEnv {
        &self.globals
    }

    /// Expose a host function to scripts as a global.
    pub fn define_native(&mut self, native: NativeFunction) {
        let name = native.name;
        self.globals
            .borrow_mut()
            .define(name, Value::Callable(Callable::Native(Rc::new(native))));
    }

    /// Run a program. Stops at the first runtime error; the global scope
    /// keeps whatever the statements before it defined.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                Ok(Flow::Return(_)) => break,
                Err(e) => {
                    // Leave the interpreter usable for the next REPL entry.
                    self.environment = Rc::clone(&self.globals);
                    self.call_depth = 0;
                    self.out.flush()?;
                    return Err(e);
                }
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Execute one statement in the current scope.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.name, value);
                self.environment.borrow_mut().define(&name.name, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope = Environment::new_child(&self.environment);
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.name);

                let function = Function::new(Rc::clone(declaration), Rc::clone(&self.environment));
                self.environment.borrow_mut().define(
                    &declaration.name.name,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.declare_class(name, superclass.as_ref(), methods)?;
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    /// Execute `statements` with `scope` as the current scope, restoring the
    /// previous scope afterwards whether they return, fall through or fail.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: SharedEnv) -> Result<Flow> {
        let previous = mem::replace(&mut self.environment, scope);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn declare_class(
        &mut self,
        name: &Identifier,
        superclass: Option<&Identifier>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Defining class '{}'", name.name);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(id) => match self.environment.borrow().get(&id.name, id.line)? {
                Value::Callable(Callable::Class(class)) => Some(class),
                _ => {
                    return Err(LangError::runtime(id.line, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(&name.name, Value::Nil);

        // Methods of a subclass close over an extra scope holding `super`.
        let method_scope = match &superclass {
            Some(superclass) => {
                let scope = Environment::new_child(&self.environment);
                scope.borrow_mut().define(
                    "super",
                    Value::Callable(Callable::Class(Rc::clone(superclass))),
                );
                scope
            }
            None => Rc::clone(&self.environment),
        };

        let methods: HashMap<String, Function> = methods
            .iter()
            .map(|declaration| {
                (
                    declaration.name.name.clone(),
                    Function::new(Rc::clone(declaration), Rc::clone(&method_scope)),
                )
            })
            .collect();

        let class = Class::new(name.name.clone(), superclass, methods);

        self.environment.borrow_mut().assign(
            &name.name,
            Value::Callable(Callable::Class(Rc::new(class))),
            name.line,
        )
    }

    /// Evaluate an expression in the current scope.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable(name) => self.environment.borrow().get(&name.name, name.line),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment
                    .borrow_mut()
                    .assign(&name.name, value.clone(), name.line)?;
                Ok(value)
            }

            Expr::Unary {
                operator,
                right,
                line,
            } => {
                let right = self.evaluate(right)?;

                match operator {
                    UnaryOp::Not => Ok(Value::Bool(!right.is_truthy())),
                    UnaryOp::Negate => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LangError::runtime(*line, "Operand must be a number.")),
                    },
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
                line,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(*operator, left, right, *line)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = match operator {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Call {
                callee,
                arguments,
                line,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(&callee, values, *line)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(&name.name, name.line),
                _ => Err(LangError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LangError::runtime(name.line, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.set(&name.name, value.clone());
                Ok(value)
            }

            Expr::This { line } => self.environment.borrow().get("this", *line),

            Expr::Super { method, line } => self.evaluate_super(method, *line),
        }
    }

    /// `super.method`: look the method up from the superclass captured when
    /// the enclosing class was declared, and bind it to the current `this`.
    ///
    /// Both names resolve dynamically. A class without a superclass declared
    /// inside a subclass method therefore sees the outer `super`, paired with
    /// its own `this`.
    fn evaluate_super(&mut self, method: &Identifier, line: usize) -> Result<Value> {
        let scope = self.environment.borrow();

        let Ok(Value::Callable(Callable::Class(superclass))) = scope.get("super", line) else {
            return Err(LangError::runtime(
                line,
                "Can't use 'super' outside of a subclass method.",
            ));
        };

        // A `super` scope only ever sits beneath a bound method's `this`.
        let Value::Instance(receiver) = scope.get("this", line)? else {
            return Err(LangError::runtime(line, "Can't use 'this' outside of a method."));
        };

        match superclass.find_method(&method.name) {
            Some(found) => Ok(Value::Callable(Callable::Function(Rc::new(
                found.bind(&receiver),
            )))),
            None => Err(LangError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.name),
            )),
        }
    }

    /// Call `callee` with already evaluated arguments. Checks callability and
    /// arity before anything runs, and bounds the call depth.
    pub fn call_value(&mut self, callee: &Value, arguments: Vec<Value>, line: usize) -> Result<Value> {
        let Value::Callable(callable) = callee else {
            return Err(LangError::runtime(
                line,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(LangError::runtime(
                line,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= self.max_call_depth {
            return Err(LangError::runtime(line, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = callable.call(self, arguments, line);
        self.call_depth -= 1;

        result
    }
}

fn binary(operator: BinaryOp, left: Value, right: Value, line: usize) -> Result<Value> {
    match (operator, left, right) {
        (BinaryOp::Equal, a, b) => Ok(Value::Bool(a == b)),
        (BinaryOp::NotEqual, a, b) => Ok(Value::Bool(a != b)),

        (BinaryOp::Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (BinaryOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (BinaryOp::Add, _, _) => Err(LangError::runtime(
            line,
            "Operands must be two numbers or two strings.",
        )),

        (BinaryOp::Subtract, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (BinaryOp::Multiply, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (BinaryOp::Divide, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (BinaryOp::Less, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
        (BinaryOp::LessEqual, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
        (BinaryOp::Greater, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
        (BinaryOp::GreaterEqual, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

        _ => Err(LangError::runtime(line, "Operands must be numbers.")),
    }
}

/// Seconds since the Unix epoch.
fn clock(_args: &[Value]) -> std::result::Result<Value, String> {
    let now = chrono::Utc::now();
    Ok(Value::Number(now.timestamp_millis() as f64 / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_mixed_operands() {
        let err = binary(BinaryOp::Add, Value::from("a"), Value::Number(1.0), 3).unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.message(), "Operands must be two numbers or two strings.");
    }

    #[test]
    fn division_by_zero_follows_ieee() {
        let v = binary(BinaryOp::Divide, Value::Number(1.0), Value::Number(0.0), 1).unwrap();
        assert_eq!(v, Value::Number(f64::INFINITY));
    }

    #[test]
    fn comparison_requires_numbers() {
        let err = binary(BinaryOp::Less, Value::from("a"), Value::from("b"), 7).unwrap_err();
        assert_eq!(err.message(), "Operands must be numbers.");
    }

    #[test]
    fn clock_is_positive() {
        match clock(&[]).unwrap() {
            Value::Number(n) => assert!(n > 0.0),
            other => panic!("expected number, got {}", other),
        }
    }
}
