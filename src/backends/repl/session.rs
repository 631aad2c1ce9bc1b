//! Session driver
//!
//! Owns the terminal, the bridge and the worker, and shuttles events between
//! them in a single async loop. All session state lives in [`Session`]; it
//! is created explicitly and released with [`Session::dispose`].

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backends::repl::bridge::{BridgeError, BridgeEvent, Effect, Prompts, SessionBridge};
use crate::backends::repl::commands::{self, CommandResult};
use crate::backends::repl::protocol::WorkerCommand;
use crate::backends::repl::terminal::{InputLine, Terminal, TerminalError, TerminalEvent};
use crate::backends::repl::worker::{WorkerError, WorkerHandle};

/// Starts a fresh worker; called once at startup and again after each loss
pub type WorkerFactory = Box<dyn FnMut() -> Result<WorkerHandle, WorkerError> + Send>;

/// Session options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub prompts: Prompts,
    /// Worker respawns allowed before the session gives up
    pub max_restarts: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            prompts: Prompts::default(),
            max_restarts: 3,
        }
    }
}

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Terminal(#[from] TerminalError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("evaluation worker lost {restarts} time(s); giving up")]
    WorkerLost { restarts: u32 },
}

enum Flow {
    Continue,
    Quit,
}

/// Interactive session
pub struct Session<T: Terminal> {
    terminal: T,
    bridge: SessionBridge,
    worker: Option<WorkerHandle>,
    spawn_worker: WorkerFactory,
    restarts: u32,
    max_restarts: u32,
    /// Loss notice held back while a continuation read is on screen
    deferred_loss: Option<String>,
}

impl<T: Terminal> Session<T> {
    /// Create a session, starting its first worker
    pub fn new(
        terminal: T,
        options: SessionOptions,
        mut spawn_worker: WorkerFactory,
    ) -> Result<Self, SessionError> {
        let worker = spawn_worker()?;
        Ok(Self {
            terminal,
            bridge: SessionBridge::new(options.prompts),
            worker: Some(worker),
            spawn_worker,
            restarts: 0,
            max_restarts: options.max_restarts,
            deferred_loss: None,
        })
    }

    pub fn bridge(&self) -> &SessionBridge {
        &self.bridge
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// Worker respawns so far
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Run until the terminal closes or the user quits
    pub async fn run(&mut self) -> Result<(), SessionError> {
        let prompt = self.bridge.prompt().to_string();
        self.terminal.read_line(&prompt)?;

        loop {
            let Some(worker) = self.worker.as_mut() else {
                return Err(SessionError::WorkerLost {
                    restarts: self.restarts,
                });
            };

            tokio::select! {
                event = self.terminal.next_event() => {
                    let flow = match event {
                        Some(TerminalEvent::Line(line)) => {
                            if self.settle_deferred_loss()? {
                                debug!("dropping line that continued a lost expression");
                                Flow::Continue
                            } else {
                                self.on_line(line)?
                            }
                        }
                        Some(TerminalEvent::Interrupt(signal)) => {
                            if !self.settle_deferred_loss()? {
                                self.feed(BridgeEvent::Interrupt(signal))?;
                            }
                            Flow::Continue
                        }
                        Some(TerminalEvent::Closed) | None => Flow::Quit,
                    };
                    if let Flow::Quit = flow {
                        debug!("terminal closed");
                        break;
                    }
                }
                response = worker.recv() => match response {
                    Some(response) => self.feed(BridgeEvent::EvaluatorResponse(response))?,
                    None => self.on_worker_lost().await?,
                },
            }
        }

        Ok(())
    }

    /// Stop the worker and release the terminal
    pub async fn dispose(mut self) {
        if let Some(worker) = self.worker.take() {
            worker.dispose().await;
        }
        self.terminal.dispose();
        info!("session disposed");
    }

    fn on_line(
        &mut self,
        line: InputLine,
    ) -> Result<Flow, SessionError> {
        if self.bridge.is_idle() {
            if let Some(result) = commands::handle(line.as_str()) {
                return self.on_command(result);
            }
        }
        self.feed(BridgeEvent::LineReady(line))?;
        Ok(Flow::Continue)
    }

    fn on_command(
        &mut self,
        result: CommandResult,
    ) -> Result<Flow, SessionError> {
        match result {
            CommandResult::Exit => return Ok(Flow::Quit),
            CommandResult::Clear => self.feed(BridgeEvent::Interrupt("clear".to_string()))?,
            CommandResult::Output(lines) => {
                for line in &lines {
                    self.terminal.write_line(line)?;
                }
                let prompt = self.bridge.prompt().to_string();
                self.terminal.read_line(&prompt)?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn on_worker_lost(&mut self) -> Result<(), SessionError> {
        self.restarts += 1;
        warn!(restarts = self.restarts, "evaluation worker lost");
        if let Some(worker) = self.worker.take() {
            worker.dispose().await;
        }
        if self.restarts > self.max_restarts {
            return Err(SessionError::WorkerLost {
                restarts: self.restarts,
            });
        }

        self.worker = Some((self.spawn_worker)()?);
        info!(restarts = self.restarts, "evaluation worker respawned");

        let reason = "worker exited".to_string();
        if self.bridge.is_evaluating() || self.bridge.is_idle() {
            return self.feed(BridgeEvent::EvaluatorLost(reason));
        }
        // A continuation read is armed and its prompt cannot be changed, so
        // the notice waits for the user to finish that line.
        debug!("deferring worker loss until the pending read completes");
        self.deferred_loss = Some(reason);
        Ok(())
    }

    /// Report a deferred worker loss; true when there was one
    fn settle_deferred_loss(&mut self) -> Result<bool, SessionError> {
        let Some(reason) = self.deferred_loss.take() else {
            return Ok(false);
        };
        self.feed(BridgeEvent::EvaluatorLost(reason))?;
        Ok(true)
    }

    fn feed(
        &mut self,
        event: BridgeEvent,
    ) -> Result<(), SessionError> {
        let effects = self.bridge.step(event)?;
        for effect in effects {
            self.apply(effect)?;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        effect: Effect,
    ) -> Result<(), SessionError> {
        match effect {
            Effect::Dispatch(request) => self.send(WorkerCommand::Eval(request)),
            Effect::ResetEvaluator { generation } => self.send(WorkerCommand::Reset { generation }),
            Effect::WriteLine(text) => self.terminal.write_line(&text)?,
            Effect::ReadLine(prompt) => self.terminal.read_line(&prompt)?,
        }
        Ok(())
    }

    /// A failed send means the worker is gone; its response stream ends
    /// too, and the loss is handled there.
    fn send(
        &mut self,
        command: WorkerCommand,
    ) {
        match self.worker.as_ref().map(|worker| worker.send(command)) {
            Some(Ok(())) => {}
            Some(Err(err)) => warn!(error = %err, "could not reach evaluation worker"),
            None => warn!("no evaluation worker"),
        }
    }
}
