//! Transport-independent worker logic
//!
//! [`WorkerCore`] turns one [`WorkerCommand`] into at most one
//! [`EvalResponse`]. Both the thread and the process transport run it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, info};

use crate::backends::repl::backend_trait::{ExecutionStats, ReplBackend};
use crate::backends::repl::protocol::{EvalOutcome, EvalResponse, Generation, WorkerCommand};

/// What the transport should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStep {
    /// Send this response back
    Reply(EvalResponse),
    /// Nothing to send
    Continue,
    /// Shut down
    Stop,
}

/// Worker state: the backend plus the generation it is serving
pub struct WorkerCore<B: ReplBackend> {
    backend: B,
    generation: Generation,
    stats: ExecutionStats,
}

impl<B: ReplBackend> WorkerCore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            generation: 0,
            stats: ExecutionStats::default(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn stats(&self) -> ExecutionStats {
        self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn handle(
        &mut self,
        command: WorkerCommand,
    ) -> WorkerStep {
        match command {
            WorkerCommand::Eval(request) => {
                self.adopt(request.generation);
                WorkerStep::Reply(self.eval_line(&request.line))
            }
            WorkerCommand::Reset { generation } => {
                debug!(generation, "reset");
                self.backend.reset();
                self.generation = generation;
                WorkerStep::Continue
            }
            WorkerCommand::Shutdown => {
                info!(
                    evals = self.stats.eval_count,
                    errors = self.stats.error_count,
                    time = ?self.stats.total_time,
                    "worker shutting down"
                );
                WorkerStep::Stop
            }
        }
    }

    /// A request from another generation means the bridge abandoned whatever
    /// we buffered, even if its `Reset` never arrived.
    fn adopt(
        &mut self,
        generation: Generation,
    ) {
        if generation != self.generation {
            debug!(from = self.generation, to = generation, "generation changed; discarding buffer");
            self.backend.reset();
            self.generation = generation;
        }
    }

    fn eval_line(
        &mut self,
        line: &str,
    ) -> EvalResponse {
        let complete = match self.backend.push_line(line) {
            Ok(complete) => complete,
            Err(err) => {
                self.backend.reset();
                self.stats.error_count += 1;
                return EvalResponse::finished(self.generation, EvalOutcome::Failure(err.to_string()));
            }
        };
        if !complete {
            return EvalResponse::incomplete(self.generation, self.backend.buffered_lines());
        }

        let started = Instant::now();
        let backend = &mut self.backend;
        let result = panic::catch_unwind(AssertUnwindSafe(|| backend.eval()));
        self.backend.reset();

        self.stats.eval_count += 1;
        self.stats.total_time += started.elapsed();

        let outcome = match result {
            Ok(Ok(text)) => EvalOutcome::Success(text),
            Ok(Err(err)) => {
                self.stats.error_count += 1;
                EvalOutcome::Failure(err.to_string())
            }
            Err(payload) => {
                self.stats.error_count += 1;
                EvalOutcome::Failure(format!("evaluator panicked: {}", panic_message(&*payload)))
            }
        };
        EvalResponse::finished(self.generation, outcome)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
