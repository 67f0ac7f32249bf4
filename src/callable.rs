//! Everything a script can call.
//!
//! [`Callable`] is a closed set of variants dispatched with `match`: user
//! functions (and bound methods, which are just functions with an extra
//! scope), classes (calling one constructs an instance) and host functions.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::{Class, Instance};
use crate::environment::{Environment, SharedEnv};
use crate::error::{LangError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

#[derive(Clone)]
pub enum Callable {
    Function(Rc<Function>),
    Class(Rc<Class>),
    Native(Rc<NativeFunction>),
}

impl Callable {
    /// Number of arguments the callee expects.
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
            Callable::Native(native) => native.arity,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Function(function) => function.name(),
            Callable::Class(class) => class.name(),
            Callable::Native(native) => native.name,
        }
    }

    /// Invoke the callee. The caller has already checked `arguments.len()`
    /// against [`arity`](Self::arity); `line` is only used to locate errors
    /// raised by native functions.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        match self {
            Callable::Function(function) => function.call(interpreter, arguments),
            Callable::Class(class) => Class::instantiate(class, interpreter, arguments),
            Callable::Native(native) => {
                (native.func)(&arguments).map_err(|msg| LangError::runtime(line, msg))
            }
        }
    }

    /// Identity comparison: same allocation, not same behaviour.
    pub fn same_as(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(function) => write!(f, "<fn {}>", function.name()),
            Callable::Class(class) => write!(f, "{}", class.name()),
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self)
    }
}

/// A user-defined function: a declaration plus the scope it closed over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: SharedEnv,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: SharedEnv) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.name
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn declaration(&self) -> &Rc<FunctionDecl> {
        &self.declaration
    }

    pub fn closure(&self) -> &SharedEnv {
        &self.closure
    }

    /// Derive a method bound to `instance`: same declaration, closure
    /// extended by one scope holding `this`. `self` is left untouched.
    pub fn bind(&self, instance: &Rc<Instance>) -> Function {
        let scope = Environment::new_child(&self.closure);
        scope
            .borrow_mut()
            .define("this", Value::Instance(Rc::clone(instance)));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: scope,
        }
    }

    /// Run the body in a fresh child of the closure with parameters bound in
    /// order. A `return` yields its value, falling off the end yields `nil`.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling function '{}'", self.name());

        let scope = Environment::new_child(&self.closure);
        {
            let mut scope = scope.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(&param.name, argument);
            }
        }

        match interpreter.execute_block(&self.declaration.body, scope)? {
            Flow::Return(value) => {
                debug!("Function '{}' returned: {}", self.name(), value);
                Ok(value)
            }
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// Signature of a host function. `Err` carries the runtime error message.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// A function implemented in Rust and exposed to scripts.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: &'static str, arity: usize, func: NativeFn) -> Self {
        Self { name, arity, func }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
