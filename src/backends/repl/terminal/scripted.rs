//! Scripted terminal
//!
//! Replays a fixed sequence of lines and interrupts. Lines are handed out
//! only when a read is armed, like a user typing at a prompt; interrupts are
//! delivered as soon as they reach the front of the script, like Ctrl-C
//! pressed during an evaluation. A pause holds back everything after it for
//! a while, so events from the evaluator side can land first. Prompts and
//! output are recorded in a shared [`Transcript`].

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{InputLine, Terminal, TerminalError, TerminalEvent};

/// One scripted input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Line(InputLine),
    Interrupt(String),
    Pause(Duration),
}

impl ScriptStep {
    pub fn line(text: &str) -> Self {
        ScriptStep::Line(text.into())
    }

    pub fn interrupt() -> Self {
        ScriptStep::Interrupt("SIGINT".to_string())
    }

    pub fn pause(delay: Duration) -> Self {
        ScriptStep::Pause(delay)
    }
}

/// Everything a scripted session showed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    /// Prompt of every armed read, in order
    pub prompts: Vec<String>,
    /// Output lines, in order
    pub output: Vec<String>,
    pub disposed: bool,
}

/// Terminal driven by a fixed script
pub struct ScriptedTerminal {
    script: VecDeque<ScriptStep>,
    armed: bool,
    echo: bool,
    transcript: Arc<Mutex<Transcript>>,
}

impl ScriptedTerminal {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            script: steps.into_iter().collect(),
            armed: false,
            echo: false,
            transcript: Arc::new(Mutex::new(Transcript::default())),
        }
    }

    /// Script made only of lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<InputLine>,
    {
        Self::new(lines.into_iter().map(|l| ScriptStep::Line(l.into())))
    }

    /// Also print output lines to stdout as they are written
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Shared handle on the transcript, readable after the session ends
    pub fn transcript(&self) -> Arc<Mutex<Transcript>> {
        Arc::clone(&self.transcript)
    }
}

impl Terminal for ScriptedTerminal {
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> Result<(), TerminalError> {
        let mut transcript = self.transcript.lock();
        if transcript.disposed {
            return Err(TerminalError::Closed);
        }
        if !self.armed {
            transcript.prompts.push(prompt.to_string());
            self.armed = true;
        }
        Ok(())
    }

    fn write_line(
        &mut self,
        text: &str,
    ) -> Result<(), TerminalError> {
        if self.echo {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text)?;
            stdout.flush()?;
        }
        self.transcript.lock().output.push(text.to_string());
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TerminalEvent> {
        loop {
            return match self.script.front() {
                Some(ScriptStep::Pause(delay)) => {
                    let delay = *delay;
                    self.script.pop_front();
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Some(ScriptStep::Interrupt(_)) => {
                    self.armed = false;
                    match self.script.pop_front() {
                        Some(ScriptStep::Interrupt(signal)) => Some(TerminalEvent::Interrupt(signal)),
                        _ => None,
                    }
                }
                Some(ScriptStep::Line(_)) if self.armed => {
                    self.armed = false;
                    match self.script.pop_front() {
                        Some(ScriptStep::Line(line)) => Some(TerminalEvent::Line(line)),
                        _ => None,
                    }
                }
                None if self.armed => Some(TerminalEvent::Closed),
                // Nothing to deliver until the driver arms a read.
                _ => std::future::pending().await,
            };
        }
    }

    fn dispose(&mut self) {
        self.script.clear();
        self.armed = false;
        self.transcript.lock().disposed = true;
    }
}
