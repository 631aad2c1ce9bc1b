//! Lisp evaluation backend
//!
//! Pairs a [`Reader`] (accumulation and completeness) with an
//! [`Evaluator`] whose global environment persists across inputs.

use tracing::debug;

use crate::backends::repl::backend_trait::ReplBackend;
use crate::frontend::Reader;
use crate::runtime::builtins;
use crate::runtime::{Evaluator, LispError, DEFAULT_MAX_DEPTH, SPECIAL_FORMS};

/// Backend evaluating the built-in Lisp dialect
pub struct LispBackend {
    reader: Reader,
    evaluator: Evaluator,
}

impl Default for LispBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LispBackend {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Backend whose reader nesting and evaluator recursion share one limit
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            reader: Reader::with_max_depth(max_depth),
            evaluator: Evaluator::with_max_depth(max_depth),
        }
    }
}

impl ReplBackend for LispBackend {
    type Error = LispError;

    fn push_line(
        &mut self,
        line: &str,
    ) -> Result<bool, LispError> {
        self.reader.push_line(line)
    }

    fn buffered_lines(&self) -> usize {
        self.reader.lines()
    }

    fn eval(&mut self) -> Result<String, LispError> {
        let exps = self.reader.take()?;
        debug!(count = exps.len(), "evaluating expressions");
        let value = self.evaluator.eval_all(&exps)?;
        Ok(value.to_string())
    }

    fn reset(&mut self) {
        self.reader.clear();
    }
}

/// Names offered by tab completion: special forms, then builtins
pub fn completion_words() -> Vec<&'static str> {
    SPECIAL_FORMS
        .iter()
        .copied()
        .chain(builtins::names())
        .collect()
}
