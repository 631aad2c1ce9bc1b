//! Line-based terminal with rustyline
//!
//! rustyline blocks while reading, so the editor lives on its own thread and
//! is driven through a command queue. Output goes through the same queue,
//! which keeps it ordered with respect to prompts.
//!
//! Ctrl-C pressed while a line is being edited surfaces as an interrupt from
//! the editor. While no line is being edited (an evaluation is running) the
//! terminal is in cooked mode and Ctrl-C raises SIGINT, which is picked up
//! through `tokio::signal` instead.

mod completer;

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::thread;

use crossbeam::channel::{self, Sender};
use owo_colors::OwoColorize;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{CompletionType, EditMode, Editor};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub use completer::LispHelper;

use super::{InputLine, Terminal, TerminalError, TerminalEvent};

/// Line terminal configuration
#[derive(Debug, Clone)]
pub struct LineTerminalConfig {
    /// Enable VI mode
    pub vi_mode: bool,
    /// History file path
    pub history_file: Option<PathBuf>,
    /// Maximum history size
    pub history_size: usize,
    /// Color error lines (only when stdout is a terminal)
    pub colors: bool,
}

impl Default for LineTerminalConfig {
    fn default() -> Self {
        Self {
            vi_mode: false,
            history_file: None,
            history_size: 1000,
            colors: true,
        }
    }
}

enum EditorCommand {
    ReadLine(String),
    WriteLine(String),
    Shutdown,
}

/// Event plus whether it ends the outstanding read
struct Delivered {
    event: TerminalEvent,
    ends_read: bool,
}

/// Interactive terminal
pub struct LineTerminal {
    commands: Sender<EditorCommand>,
    events: mpsc::UnboundedReceiver<Delivered>,
    reading: bool,
    closed: bool,
    editor_thread: Option<thread::JoinHandle<()>>,
    signal_task: Option<tokio::task::JoinHandle<()>>,
}

impl LineTerminal {
    /// Start the editor thread and the SIGINT listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: LineTerminalConfig) -> Result<Self, TerminalError> {
        let (command_tx, command_rx) = channel::unbounded::<EditorCommand>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Delivered>();
        let (ready_tx, ready_rx) = channel::bounded::<Result<(), ReadlineError>>(1);

        let editor_events = event_tx.clone();
        let editor_thread = thread::Builder::new()
            .name("line-editor".into())
            .spawn(move || {
                let mut editor = match build_editor(&config) {
                    Ok(editor) => {
                        let _ = ready_tx.send(Ok(()));
                        editor
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let colors = config.colors && std::io::stdout().is_terminal();

                for command in command_rx.iter() {
                    match command {
                        EditorCommand::ReadLine(prompt) => {
                            let (event, stop) = match editor.readline(&prompt) {
                                Ok(line) => (TerminalEvent::Line(InputLine::from(line)), false),
                                Err(ReadlineError::Interrupted) => {
                                    (TerminalEvent::Interrupt("SIGINT".to_string()), false)
                                }
                                Err(ReadlineError::Eof) => (TerminalEvent::Closed, true),
                                Err(err) => {
                                    warn!(error = %err, "line editor failed");
                                    (TerminalEvent::Closed, true)
                                }
                            };
                            let delivered = Delivered {
                                event,
                                ends_read: true,
                            };
                            if editor_events.send(delivered).is_err() || stop {
                                break;
                            }
                        }
                        EditorCommand::WriteLine(text) => {
                            let mut stdout = std::io::stdout().lock();
                            let written = if colors && text.starts_with("Error:") {
                                writeln!(stdout, "{}", text.red())
                            } else {
                                writeln!(stdout, "{}", text)
                            };
                            if let Err(err) = written.and_then(|_| stdout.flush()) {
                                warn!(error = %err, "failed to write output");
                            }
                        }
                        EditorCommand::Shutdown => break,
                    }
                }

                if let Some(path) = &config.history_file {
                    if let Err(err) = editor.save_history(path) {
                        warn!(error = %err, path = %path.display(), "failed to save history");
                    }
                }
                debug!("line editor thread exiting");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(TerminalError::Editor(err)),
            Err(_) => return Err(TerminalError::Closed),
        }

        let signal_task = tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                let delivered = Delivered {
                    event: TerminalEvent::Interrupt("SIGINT".to_string()),
                    ends_read: false,
                };
                if event_tx.send(delivered).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            reading: false,
            closed: false,
            editor_thread: Some(editor_thread),
            signal_task: Some(signal_task),
        })
    }

    fn send(
        &self,
        command: EditorCommand,
    ) -> Result<(), TerminalError> {
        self.commands.send(command).map_err(|_| TerminalError::Closed)
    }
}

fn build_editor(config: &LineTerminalConfig) -> Result<Editor<LispHelper, FileHistory>, ReadlineError> {
    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .max_history_size(config.history_size)?
        .completion_type(CompletionType::List)
        .edit_mode(if config.vi_mode {
            EditMode::Vi
        } else {
            EditMode::Emacs
        })
        .build();

    let mut editor = Editor::with_config(rl_config)?;
    editor.set_helper(Some(LispHelper::new()));

    // Load history if file exists
    if let Some(history_file) = &config.history_file {
        if history_file.exists() {
            if let Err(err) = editor.load_history(history_file) {
                warn!(error = %err, "failed to load history");
            }
        }
    }

    Ok(editor)
}

impl Terminal for LineTerminal {
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> Result<(), TerminalError> {
        if self.closed {
            return Err(TerminalError::Closed);
        }
        if self.reading {
            debug!("read already armed");
            return Ok(());
        }
        self.send(EditorCommand::ReadLine(prompt.to_string()))?;
        self.reading = true;
        Ok(())
    }

    fn write_line(
        &mut self,
        text: &str,
    ) -> Result<(), TerminalError> {
        self.send(EditorCommand::WriteLine(text.to_string()))
    }

    async fn next_event(&mut self) -> Option<TerminalEvent> {
        let delivered = self.events.recv().await?;
        if delivered.ends_read {
            self.reading = false;
        }
        if delivered.event == TerminalEvent::Closed {
            self.closed = true;
        }
        Some(delivered.event)
    }

    fn dispose(&mut self) {
        if let Some(task) = self.signal_task.take() {
            task.abort();
        }
        let _ = self.commands.send(EditorCommand::Shutdown);
        // A thread still blocked in readline cannot be woken; only join an idle one.
        if let Some(handle) = self.editor_thread.take() {
            if !self.reading || handle.is_finished() {
                let _ = handle.join();
            }
        }
        self.closed = true;
    }
}

impl Drop for LineTerminal {
    fn drop(&mut self) {
        self.dispose();
    }
}
