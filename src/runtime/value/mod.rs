//! Runtime values
//!
//! Code and data share one representation: the reader produces [`Value`]s
//! and the evaluator consumes and returns them.

pub mod rational;


use std::fmt;
use std::rc::Rc;

pub use rational::Rational;

use crate::runtime::builtins::Builtin;
use crate::runtime::env::EnvRef;

/// A Lisp value
#[derive(Clone)]
pub enum Value {
    /// The empty value `nil`
    Nil,
    /// Result of forms evaluated only for effect (e.g. `define`); prints as nothing
    Unspecified,
    Bool(bool),
    Number(Rational),
    Str(String),
    Symbol(String),
    /// Proper list
    List(Vec<Value>),
    /// Improper list `(a b . c)`: the items and the final tail
    Dotted(Vec<Value>, Box<Value>),
    Builtin(Builtin),
    Lambda(Rc<Lambda>),
}

/// A user-defined procedure closing over its defining environment
pub struct Lambda {
    /// Name, when bound through `(define (name ...) ...)`
    pub name: Option<String>,
    pub params: Vec<String>,
    /// Parameter collecting the remaining arguments, if variadic
    pub rest: Option<String>,
    pub body: Vec<Value>,
    pub env: EnvRef,
}

impl Value {
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn number(n: i64) -> Self {
        Value::Number(Rational::integer(n))
    }

    /// Only `false` and `nil` are false.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Builtin(_) | Value::Lambda(_))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Unspecified => "unspecified",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) | Value::Dotted(..) => "list",
            Value::Builtin(_) | Value::Lambda(_) => "procedure",
        }
    }
}

impl PartialEq for Value {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Unspecified, Value::Unspecified) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dotted(a, x), Value::Dotted(b, y)) => a == b && x == y,
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::Unspecified => write!(f, "#<unspecified>"),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Unspecified => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                write!(f, ")")
            }
            Value::Dotted(items, tail) => {
                write!(f, "(")?;
                write_items(f, items)?;
                write!(f, " . {})", tail)
            }
            Value::Builtin(b) => write!(f, "#<builtin {}>", b.name),
            Value::Lambda(l) => match &l.name {
                Some(name) => write!(f, "#<lambda {}>", name),
                None => write!(f, "#<lambda>"),
            },
        }
    }
}

fn write_items(
    f: &mut fmt::Formatter<'_>,
    items: &[Value],
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
