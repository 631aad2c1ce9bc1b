//! Evaluation worker
//!
//! The evaluator runs in an isolated context and is reached only through
//! [`WorkerHandle`]:
//!
//! - thread isolation: a dedicated OS thread with a large stack, commands on
//!   a crossbeam channel (the thread blocks on it), responses on a tokio
//!   channel (the session awaits them);
//! - process isolation: a child `lisp-session worker` process speaking JSON
//!   lines over stdin/stdout.
//!
//! Either way, the response stream ending means the worker is gone.

pub mod service;
pub mod stdio;


use std::path::Path;
use std::process::Stdio;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use self::service::{WorkerCore, WorkerStep};
pub use self::stdio::run_stdio_worker;

use crate::backends::repl::backend_trait::ReplBackend;
use crate::backends::repl::protocol::{decode, encode, EvalResponse, WorkerCommand};

/// Stack size of the worker thread; deep recursion in user code lives here
pub const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Grace period for a child process to exit after `Shutdown`
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Worker errors
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to start evaluation worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker process has no {0} pipe")]
    MissingPipe(&'static str),
    #[error("evaluation worker is gone")]
    Disconnected,
}

/// Handle on a running worker
pub struct WorkerHandle {
    transport: Transport,
}

enum Transport {
    Thread(ThreadWorker),
    Process(ProcessWorker),
}

struct ThreadWorker {
    commands: crossbeam::channel::Sender<WorkerCommand>,
    responses: mpsc::UnboundedReceiver<EvalResponse>,
    thread: Option<thread::JoinHandle<()>>,
}

struct ProcessWorker {
    child: Child,
    commands: mpsc::UnboundedSender<WorkerCommand>,
    responses: mpsc::UnboundedReceiver<EvalResponse>,
}

/// Run a worker on a dedicated thread.
///
/// `factory` builds the backend on the worker thread, so the backend itself
/// need not be `Send`.
pub fn spawn_thread<B, F>(factory: F) -> Result<WorkerHandle, WorkerError>
where
    B: ReplBackend,
    F: FnOnce() -> B + Send + 'static,
{
    let (command_tx, command_rx) = crossbeam::channel::unbounded::<WorkerCommand>();
    let (response_tx, response_rx) = mpsc::unbounded_channel::<EvalResponse>();

    let thread = thread::Builder::new()
        .name("lisp-worker".into())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || {
            let mut core = WorkerCore::new(factory());
            while let Ok(command) = command_rx.recv() {
                match core.handle(command) {
                    WorkerStep::Reply(response) => {
                        if response_tx.send(response).is_err() {
                            break;
                        }
                    }
                    WorkerStep::Continue => {}
                    WorkerStep::Stop => break,
                }
            }
            debug!("worker thread exiting");
        })?;

    info!("evaluation worker started on a thread");
    Ok(WorkerHandle {
        transport: Transport::Thread(ThreadWorker {
            commands: command_tx,
            responses: response_rx,
            thread: Some(thread),
        }),
    })
}

/// Run a worker as a child process: `program args...` must serve the
/// JSON-line protocol on its stdio (see [`run_stdio_worker`]).
///
/// Must be called from within a tokio runtime.
pub fn spawn_process(
    program: &Path,
    args: &[String],
) -> Result<WorkerHandle, WorkerError> {
    let mut command = std::process::Command::new(program);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    // Keep the child out of the terminal's process group so Ctrl-C reaches
    // only the session, which turns it into an interrupt.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = Command::from(command).kill_on_drop(true).spawn()?;

    let mut stdin = child.stdin.take().ok_or(WorkerError::MissingPipe("stdin"))?;
    let stdout = child.stdout.take().ok_or(WorkerError::MissingPipe("stdout"))?;

    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<WorkerCommand>();
    let (response_tx, response_rx) = mpsc::unbounded_channel::<EvalResponse>();

    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            let mut line = match encode(&command) {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "failed to encode command");
                    continue;
                }
            };
            line.push('\n');
            if let Err(err) = async {
                stdin.write_all(line.as_bytes()).await?;
                stdin.flush().await
            }
            .await
            {
                warn!(error = %err, "worker stdin closed");
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match decode::<EvalResponse>(&line) {
                    Ok(response) => {
                        if response_tx.send(response).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "dropping malformed response"),
                },
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "failed to read from worker");
                    break;
                }
            }
        }
        debug!("worker stdout closed");
    });

    info!(pid = child.id(), "evaluation worker started as a process");
    Ok(WorkerHandle {
        transport: Transport::Process(ProcessWorker {
            child,
            commands: command_tx,
            responses: response_rx,
        }),
    })
}

impl WorkerHandle {
    /// Queue a command; never blocks
    pub fn send(
        &self,
        command: WorkerCommand,
    ) -> Result<(), WorkerError> {
        match &self.transport {
            Transport::Thread(worker) => worker
                .commands
                .send(command)
                .map_err(|_| WorkerError::Disconnected),
            Transport::Process(worker) => worker
                .commands
                .send(command)
                .map_err(|_| WorkerError::Disconnected),
        }
    }

    /// Next response; `None` once the worker is gone
    pub async fn recv(&mut self) -> Option<EvalResponse> {
        match &mut self.transport {
            Transport::Thread(worker) => worker.responses.recv().await,
            Transport::Process(worker) => worker.responses.recv().await,
        }
    }

    /// Ask the worker to stop and release it.
    ///
    /// A child process that does not exit promptly is killed. A thread still
    /// busy evaluating is detached; it exits once it sees the closed channel.
    pub async fn dispose(self) {
        let _ = self.send(WorkerCommand::Shutdown);
        match self.transport {
            Transport::Thread(mut worker) => {
                drop(worker.commands);
                if let Some(thread) = worker.thread.take() {
                    if thread.is_finished() {
                        let _ = thread.join();
                    }
                }
            }
            Transport::Process(mut worker) => {
                drop(worker.commands);
                match tokio::time::timeout(SHUTDOWN_GRACE, worker.child.wait()).await {
                    Ok(Ok(status)) => debug!(%status, "worker process exited"),
                    _ => {
                        warn!("worker process did not exit; killing it");
                        let _ = worker.child.kill().await;
                    }
                }
            }
        }
    }
}
