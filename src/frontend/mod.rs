//! Frontend: turns source text into values
//!
//! The lexer produces tokens and the reader groups lines into complete
//! expressions and parses them.

pub mod lexer;
pub mod reader;

pub use reader::{read, read_with_max_depth, Reader};
