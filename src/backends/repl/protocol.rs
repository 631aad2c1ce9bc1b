//! Messages exchanged between the session bridge and the evaluation worker
//!
//! The same types travel over in-process channels (thread isolation) and,
//! serialized as one JSON object per line, over a child's stdin/stdout
//! (process isolation).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Session generation. Bumped by the bridge on every interrupt and resync.
pub type Generation = u64;

/// Request to append one line to the worker's buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalRequest {
    pub generation: Generation,
    pub line: String,
}

/// Bridge -> worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WorkerCommand {
    Eval(EvalRequest),
    /// Drop any buffered input and adopt `generation`
    Reset { generation: Generation },
    Shutdown,
}

/// Result of a completed evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum EvalOutcome {
    Success(String),
    Failure(String),
}

/// Worker -> bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResponse {
    pub generation: Generation,
    /// The buffered input formed a complete unit and was consumed
    pub complete: bool,
    /// Present exactly when `complete`
    pub outcome: Option<EvalOutcome>,
    /// The worker cleared its buffer while handling the request
    pub reset_buffer: bool,
    /// Lines the worker still holds after handling the request
    pub buffered_lines: usize,
}

impl EvalResponse {
    /// More input is needed
    pub fn incomplete(
        generation: Generation,
        buffered_lines: usize,
    ) -> Self {
        Self {
            generation,
            complete: false,
            outcome: None,
            reset_buffer: false,
            buffered_lines,
        }
    }

    /// The buffer was consumed, producing `outcome`
    pub fn finished(
        generation: Generation,
        outcome: EvalOutcome,
    ) -> Self {
        Self {
            generation,
            complete: true,
            outcome: Some(outcome),
            reset_buffer: true,
            buffered_lines: 0,
        }
    }
}

/// Serialize a message as a single JSON line (without the trailing newline)
pub fn encode<T: Serialize>(message: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

/// Parse one JSON line
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(line.trim_end())
}
