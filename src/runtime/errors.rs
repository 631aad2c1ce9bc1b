//! Reader and evaluator errors

use thiserror::Error;

use crate::frontend::lexer::LexError;

/// Result alias used by the reader and evaluator
pub type LispResult<T> = Result<T, LispError>;

/// Errors raised while reading or evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LispError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Unexpected ')'")]
    UnexpectedClose,

    #[error("Unexpected EOF while parsing")]
    UnexpectedEof,

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Expression nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("Symbol {0} not found")]
    Unbound(String),

    #[error("Expected {expected}, found {found}")]
    Type {
        expected: &'static str,
        found: String,
    },

    #[error("{name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("{0} is not a procedure")]
    NotCallable(String),

    #[error("{0} called on empty list")]
    EmptyList(&'static str),

    #[error("Invalid {form} form: {reason}")]
    BadForm {
        form: &'static str,
        reason: String,
    },

    #[error("Recursion limit of {0} exceeded")]
    RecursionLimit(usize),
}

impl LispError {
    pub(crate) fn type_error(
        expected: &'static str,
        found: &crate::runtime::Value,
    ) -> Self {
        LispError::Type {
            expected,
            found: found.to_string(),
        }
    }

    pub(crate) fn bad_form(
        form: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        LispError::BadForm {
            form,
            reason: reason.into(),
        }
    }
}
