//! Language runtime: values, environments, builtins and the evaluator
//!
//! Everything here is single-threaded (`Rc`-based) and lives entirely
//! inside the evaluation worker.

pub mod builtins;
pub mod env;
pub mod errors;
pub mod eval;
pub mod value;

pub use errors::{LispError, LispResult};
pub use eval::{Evaluator, DEFAULT_MAX_DEPTH, SPECIAL_FORMS};
pub use value::{Rational, Value};
