//! Token types

use crate::runtime::value::Rational;

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Delimiters
    LParen,
    RParen,
    Quote,
    Dot,

    // Literals
    Number(Rational),
    Str(String),
    Bool(bool),
    Nil,

    Symbol(String),
}

/// Token with the (1-based) line it started on
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}
