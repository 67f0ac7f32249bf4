//! Lexical scopes.
//!
//! A scope maps names to values and optionally points at the scope that
//! encloses it. Scopes are shared (`Rc<RefCell<_>>`): a block, a function call
//! and any number of closures may hold the same enclosing scope, and a write
//! through one holder is seen by all of them.

use crate::error::{LangError, Result};
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a scope.
pub type SharedEnv = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<SharedEnv>,
}

impl Environment {
    /// A root scope with no parent.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: SharedEnv) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Shared root scope, ready to be captured.
    pub fn new_global() -> SharedEnv {
        Rc::new(RefCell::new(Environment::new()))
    }

    /// A new, empty scope enclosed by `enclosing`.
    pub fn new_child(enclosing: &SharedEnv) -> SharedEnv {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<SharedEnv> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope. Shadows outer bindings, overwrites a
    /// binding of the same name in this scope.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    /// Innermost binding of `name`, searching outward.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Overwrite the innermost binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Whether `name` is bound in this scope itself (outer scopes ignored).
    pub fn contains_local(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of scopes from this one up to the root, inclusive.
    pub fn depth(&self) -> usize {
        1 + self
            .enclosing
            .as_ref()
            .map_or(0, |enclosing| enclosing.borrow().depth())
    }
}

fn undefined(name: &str, line: usize) -> LangError {
    LangError::runtime(line, format!("Undefined variable '{}'.", name))
}

impl fmt::Debug for Environment {
    // Values may hold closures over this very scope; print names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_enclosing", &self.enclosing.is_some())
            .finish()
    }
}
