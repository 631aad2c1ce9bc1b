//! Lexical environments

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::builtins;
use crate::runtime::errors::{LispError, LispResult};
use crate::runtime::Value;

/// Shared, mutable environment handle
pub type EnvRef = Rc<RefCell<Env>>;

/// One scope of bindings with an optional enclosing scope
#[derive(Default)]
pub struct Env {
    vars: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Env {
    /// Top-level environment with every builtin bound
    pub fn global() -> EnvRef {
        let mut env = Env::default();
        for builtin in builtins::all() {
            env.vars
                .insert(builtin.name.to_string(), Value::Builtin(builtin));
        }
        Rc::new(RefCell::new(env))
    }

    /// New empty scope enclosed by `parent`
    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Env {
            vars: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    pub fn get(
        &self,
        name: &str,
    ) -> LispResult<Value> {
        if let Some(value) = self.vars.get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => Err(LispError::Unbound(name.to_string())),
        }
    }

    /// Bind `name` in this scope, shadowing any outer binding
    pub fn define(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) {
        self.vars.insert(name.into(), value);
    }
}
