//! Classes and their instances.
//!
//! A [`Class`] owns its methods and shares its superclass. Method lookup
//! walks the superclass chain, most-derived first, stopping at the first
//! match. An [`Instance`] shares its class and owns its fields; fields are
//! created on first write and shadow methods of the same name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, Function};
use crate::error::{LangError, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Name of the method run on construction.
pub const INITIALIZER: &str = "init";

pub struct Class {
    name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Function>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Rc<Class>> {
        self.superclass.as_ref()
    }

    /// Own methods first, then the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<&Function> {
        self.methods.get(name).or_else(|| {
            self.superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name))
        })
    }

    /// Mirrors the initializer's arity, `0` without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, Function::arity)
    }

    /// Allocate an instance and run `init` on it if the class (or an
    /// ancestor) defines one. Whatever `init` returns is dropped: the result
    /// is always the new instance.
    pub fn instantiate(
        class: &Rc<Class>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(Instance::new(Rc::clone(class)));

        if let Some(initializer) = class.find_method(INITIALIZER) {
            initializer.bind(&instance).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        f.debug_struct("Class")
            .field("name", &self.name)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|superclass| superclass.name()),
            )
            .field("methods", &methods)
            .finish()
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Field `name` if set, otherwise the method `name` bound to this
    /// instance. Every method access binds anew.
    pub fn get(self: &Rc<Self>, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.fields.borrow().get(name) {
            return Ok(value.clone());
        }

        match self.class.find_method(name) {
            Some(method) => Ok(Value::Callable(Callable::Function(Rc::new(
                method.bind(self),
            )))),
            None => Err(LangError::runtime(
                line,
                format!("Undefined property '{}'.", name),
            )),
        }
    }

    /// Create or overwrite a field.
    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }

    /// The field alone, ignoring methods.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}
