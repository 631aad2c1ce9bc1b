//! REPL Backend Trait
//!
//! Defines the interface the evaluation worker drives: a line accumulator
//! that can judge completeness, plus an evaluator for the completed buffer.

use std::fmt;
use std::time::Duration;

/// Execution statistics kept by the worker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Number of completed evaluations (successful or not)
    pub eval_count: usize,
    /// Number of evaluations that ended in an error
    pub error_count: usize,
    /// Total time spent evaluating
    pub total_time: Duration,
}

/// REPL Backend Trait
///
/// Implementations own the accumulated source of the expression being
/// entered. The worker only ever calls them from one thread.
pub trait ReplBackend {
    /// Error reported for malformed input or failed evaluation
    type Error: fmt::Display;

    /// Append one line; `Ok(true)` when the buffer now forms complete input
    fn push_line(
        &mut self,
        line: &str,
    ) -> Result<bool, Self::Error>;

    /// Lines currently held in the buffer
    fn buffered_lines(&self) -> usize;

    /// Evaluate the complete buffer and render the result.
    ///
    /// The buffer is consumed whether or not evaluation succeeds.
    fn eval(&mut self) -> Result<String, Self::Error>;

    /// Discard any partially entered input
    fn reset(&mut self);
}
