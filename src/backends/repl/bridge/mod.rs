//! Session bridge
//!
//! The bridge owns the pending input buffer and the session state, and is
//! the only component that decides which prompt to show and when to talk to
//! the evaluator. It is a pure transition function: every call to
//! [`SessionBridge::step`] consumes one [`BridgeEvent`] and returns the
//! [`Effect`]s the driver must perform, in order. It never does I/O itself.
//!
//! ```text
//!                 LineReady / Dispatch
//!   AwaitingLine ----------------------> Evaluating { generation }
//!        ^                                    |
//!        |   EvaluatorResponse (current gen)  |
//!        +------------------------------------+
//!        |                                    |
//!        +------------ Interrupt -------------+
//! ```
//!
//! Each interrupt or detected desync bumps the generation, so a response
//! still in flight for an abandoned request is recognised and dropped.


use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backends::repl::protocol::{EvalOutcome, EvalRequest, EvalResponse, Generation};
use crate::backends::repl::terminal::InputLine;

/// Line written when the evaluator's answer contradicts the bridge
pub const DESYNC_MESSAGE: &str = "Error: evaluator out of sync; input discarded";

/// Prompt strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    /// Shown when no expression is partially entered
    pub primary: String,
    /// Shown while an expression spans lines
    pub continuation: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            primary: "> ".to_string(),
            continuation: ". ".to_string(),
        }
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    AwaitingLine,
    Evaluating { generation: Generation },
}

/// Input to the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    LineReady(InputLine),
    EvaluatorResponse(EvalResponse),
    /// Out-of-band interrupt; the payload names the signal and is informational
    Interrupt(String),
    /// The evaluator died and has been replaced
    EvaluatorLost(String),
}

/// Action the driver must carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Dispatch(EvalRequest),
    ResetEvaluator { generation: Generation },
    WriteLine(String),
    ReadLine(String),
}

/// Bridge errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("a line arrived while an evaluation is in flight")]
    Busy,
}

/// Session bridge state machine
#[derive(Debug)]
pub struct SessionBridge {
    state: BridgeState,
    generation: Generation,
    /// Lines of the expression being entered, each with its terminator
    pending: String,
    pending_lines: usize,
    /// Last response asked for more input
    awaiting_more: bool,
    prompts: Prompts,
}

impl Default for SessionBridge {
    fn default() -> Self {
        Self::new(Prompts::default())
    }
}

impl SessionBridge {
    pub fn new(prompts: Prompts) -> Self {
        Self {
            state: BridgeState::AwaitingLine,
            generation: 0,
            pending: String::new(),
            pending_lines: 0,
            awaiting_more: false,
            prompts,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Accumulated text of the expression being entered
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn pending_lines(&self) -> usize {
        self.pending_lines
    }

    pub fn is_evaluating(&self) -> bool {
        matches!(self.state, BridgeState::Evaluating { .. })
    }

    /// True at a primary prompt boundary: nothing pending, nothing in flight
    pub fn is_idle(&self) -> bool {
        !self.is_evaluating() && self.pending.is_empty()
    }

    /// Prompt for the next read
    pub fn prompt(&self) -> &str {
        if self.awaiting_more {
            &self.prompts.continuation
        } else {
            &self.prompts.primary
        }
    }

    /// Advance the state machine by one event
    pub fn step(
        &mut self,
        event: BridgeEvent,
    ) -> Result<Vec<Effect>, BridgeError> {
        match event {
            BridgeEvent::LineReady(line) => self.on_line_ready(line),
            BridgeEvent::EvaluatorResponse(response) => Ok(self.on_evaluator_response(response)),
            BridgeEvent::Interrupt(signal) => Ok(self.on_interrupt(&signal)),
            BridgeEvent::EvaluatorLost(reason) => Ok(self.on_evaluator_lost(&reason)),
        }
    }

    fn on_line_ready(
        &mut self,
        line: InputLine,
    ) -> Result<Vec<Effect>, BridgeError> {
        if self.is_evaluating() {
            return Err(BridgeError::Busy);
        }

        // Blank input at the primary prompt has nothing to evaluate.
        if self.pending.is_empty() && line.is_blank() {
            return Ok(vec![Effect::ReadLine(self.prompt().to_string())]);
        }

        let line = line.into_string();
        self.pending.push_str(&line);
        self.pending.push('\n');
        self.pending_lines += 1;
        self.state = BridgeState::Evaluating {
            generation: self.generation,
        };
        debug!(generation = self.generation, lines = self.pending_lines, "dispatching line");

        Ok(vec![Effect::Dispatch(EvalRequest {
            generation: self.generation,
            line,
        })])
    }

    fn on_evaluator_response(
        &mut self,
        response: EvalResponse,
    ) -> Vec<Effect> {
        let BridgeState::Evaluating { generation } = self.state else {
            debug!(generation = response.generation, "ignoring response while awaiting a line");
            return Vec::new();
        };

        if response.generation < generation {
            debug!(
                stale = response.generation,
                current = generation,
                "ignoring stale response"
            );
            return Vec::new();
        }
        if response.generation > generation {
            return self.resync("response from a newer generation");
        }

        if !response.complete {
            if response.buffered_lines != self.pending_lines {
                return self.resync("evaluator buffer length differs");
            }
            self.awaiting_more = true;
            self.state = BridgeState::AwaitingLine;
            return vec![Effect::ReadLine(self.prompt().to_string())];
        }

        let outcome = match response.outcome {
            Some(outcome) if response.reset_buffer => outcome,
            Some(_) => return self.resync("evaluator kept its buffer after completing"),
            None => return self.resync("completed response without an outcome"),
        };

        self.clear();
        let mut effects = Vec::with_capacity(2);
        if let Some(text) = render(outcome) {
            effects.push(Effect::WriteLine(text));
        }
        effects.push(Effect::ReadLine(self.prompt().to_string()));
        effects
    }

    fn on_interrupt(
        &mut self,
        signal: &str,
    ) -> Vec<Effect> {
        info!(signal, discarded_lines = self.pending_lines, "interrupt");
        self.abandon();
        vec![
            Effect::ResetEvaluator {
                generation: self.generation,
            },
            Effect::ReadLine(self.prompt().to_string()),
        ]
    }

    fn on_evaluator_lost(
        &mut self,
        reason: &str,
    ) -> Vec<Effect> {
        warn!(reason, "evaluator lost");
        self.abandon();
        vec![
            Effect::WriteLine(format!("Error: evaluator lost: {}", reason)),
            Effect::ResetEvaluator {
                generation: self.generation,
            },
            Effect::ReadLine(self.prompt().to_string()),
        ]
    }

    fn resync(
        &mut self,
        reason: &str,
    ) -> Vec<Effect> {
        warn!(reason, generation = self.generation, "evaluator desync");
        self.abandon();
        vec![
            Effect::ResetEvaluator {
                generation: self.generation,
            },
            Effect::WriteLine(DESYNC_MESSAGE.to_string()),
            Effect::ReadLine(self.prompt().to_string()),
        ]
    }

    /// Drop pending input and start a new generation
    fn abandon(&mut self) {
        self.clear();
        self.generation += 1;
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.pending_lines = 0;
        self.awaiting_more = false;
        self.state = BridgeState::AwaitingLine;
    }
}

/// Terminal text for an outcome; an empty success prints nothing
pub fn render(outcome: EvalOutcome) -> Option<String> {
    match outcome {
        EvalOutcome::Success(text) if text.is_empty() => None,
        EvalOutcome::Success(text) => Some(text),
        EvalOutcome::Failure(message) => Some(format!("Error: {}", message)),
    }
}
