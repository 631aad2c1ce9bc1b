//! Terminal adapters
//!
//! A terminal turns keyboard input into discrete events and renders output
//! and prompts. Reads are armed explicitly: [`Terminal::read_line`] asks for
//! one line, which later arrives through [`Terminal::next_event`]. Interrupts
//! may arrive at any time, armed or not.
//!
//! - [`line::LineTerminal`] - interactive terminal on rustyline
//! - [`scripted::ScriptedTerminal`] - replays a fixed script (pipes, tests)

pub mod line;
pub mod scripted;

use std::fmt;

use thiserror::Error;

pub use line::{LineTerminal, LineTerminalConfig};
pub use scripted::{ScriptStep, ScriptedTerminal, Transcript};

/// One physical line of input, without its terminator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputLine(String);

impl InputLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Build from raw bytes; invalid UTF-8 is replaced, a trailing
    /// `\n` or `\r\n` is stripped.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        Self(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for InputLine {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<String> for InputLine {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for InputLine {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event delivered by a terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Line(InputLine),
    /// Interrupt request; the payload names the source (e.g. `SIGINT`)
    Interrupt(String),
    /// Input is exhausted (Ctrl-D, end of script, closed pipe)
    Closed,
}

/// Terminal errors
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("terminal is closed")]
    Closed,
    #[error("line editor error: {0}")]
    Editor(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Terminal front end as seen by the session driver
#[allow(async_fn_in_trait)]
pub trait Terminal {
    /// Arm one read with `prompt`. Arming while a read is already
    /// outstanding has no effect.
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> Result<(), TerminalError>;

    /// Write one line of output
    fn write_line(
        &mut self,
        text: &str,
    ) -> Result<(), TerminalError>;

    /// Wait for the next event; `None` once the terminal is gone
    async fn next_event(&mut self) -> Option<TerminalEvent>;

    /// Release the terminal
    fn dispose(&mut self);
}
