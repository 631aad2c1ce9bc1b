//! Execution backends
//!
//! The only backend is the interactive REPL session in [`repl`].

pub mod repl;
