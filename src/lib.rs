//! lisp-session
//!
//! An interactive, multi-line, interruptible REPL for a small Scheme-like
//! language. Terminal input flows through a session bridge that decides
//! prompts and completeness, while evaluation happens in an isolated worker
//! thread or process.
//!
//! # Example
//!
//! ```
//! use lisp_session::eval_source;
//!
//! let out = eval_source("(define (sq x) (* x x)) (sq 12)").unwrap();
//! assert_eq!(out, "144");
//! ```

#![warn(rust_2018_idioms)]

// Public modules
pub mod backends;
pub mod frontend;
pub mod runtime;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

use std::fs;
use std::path::Path;

use tracing::debug;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Program name
pub const NAME: &str = "lisp-session";

/// Evaluate source code in process and render the value of the last
/// expression (empty for definitions and empty input)
pub fn eval_source(source: &str) -> Result<String> {
    eval_source_with_depth(source, runtime::DEFAULT_MAX_DEPTH)
}

/// [`eval_source`] with nesting and recursion bounded by `max_depth`
pub fn eval_source_with_depth(
    source: &str,
    max_depth: usize,
) -> Result<String> {
    let exps = frontend::read_with_max_depth(source, max_depth)?;
    debug!(count = exps.len(), max_depth, "evaluating source");
    let mut evaluator = runtime::Evaluator::with_max_depth(max_depth);
    let value = evaluator.eval_all(&exps)?;
    Ok(value.to_string())
}

/// Evaluate a source file, see [`eval_source`]
pub fn run_file(path: &Path) -> Result<String> {
    run_file_with_depth(path, runtime::DEFAULT_MAX_DEPTH)
}

/// [`run_file`] with nesting and recursion bounded by `max_depth`
pub fn run_file_with_depth(
    path: &Path,
    max_depth: usize,
) -> Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    debug!(path = %path.display(), "running file");
    eval_source_with_depth(&source, max_depth)
        .with_context(|| format!("Failed to evaluate {}", path.display()))
}
