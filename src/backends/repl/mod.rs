//! REPL Module
//!
//! An interruptible, multi-line REPL whose evaluator runs in an isolated
//! worker.
//!
//! This module contains:
//! - [`bridge::SessionBridge`] - Accumulation, prompt and interrupt state machine
//! - [`protocol`] - Messages between the bridge and the worker
//! - [`worker`] - Thread and process workers driving a [`ReplBackend`]
//! - [`engine::LispBackend`] - Backend for the built-in Lisp dialect
//! - [`terminal`] - Interactive and scripted terminals
//! - [`commands`] - `:help`, `:quit` and `:clear`
//! - [`session::Session`] - The async loop tying them together

pub mod backend_trait;
pub mod bridge;
pub mod commands;
pub mod engine;
pub mod protocol;
pub mod session;
pub mod terminal;
pub mod worker;

pub use backend_trait::{ExecutionStats, ReplBackend};
pub use bridge::{BridgeError, BridgeEvent, BridgeState, Effect, Prompts, SessionBridge};
pub use engine::LispBackend;
pub use protocol::{EvalOutcome, EvalRequest, EvalResponse, WorkerCommand};
pub use session::{Session, SessionError, SessionOptions, WorkerFactory};
pub use terminal::{InputLine, LineTerminal, ScriptedTerminal, Terminal, TerminalEvent};
pub use worker::{spawn_process, spawn_thread, WorkerError, WorkerHandle};
