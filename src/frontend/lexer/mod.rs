//! Lexer module

pub mod tokens;


pub use tokens::{Token, TokenKind};
pub use tokenizer::tokenize;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated string starting on line {line}")]
    UnterminatedString { line: usize },
    #[error("Invalid escape sequence: \\{ch}")]
    InvalidEscape { ch: char },
    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),
}

/// Tokenize source code
mod tokenizer {
    use super::*;
    use crate::runtime::value::Rational;
    use std::iter::Peekable;
    use std::str::Chars;

    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();

        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    struct Lexer<'a> {
        chars: Peekable<Chars<'a>>,
        line: usize,
    }

    impl<'a> Lexer<'a> {
        fn new(source: &'a str) -> Self {
            Self {
                chars: source.chars().peekable(),
                line: 1,
            }
        }

        fn advance(&mut self) -> Option<char> {
            let c = self.chars.next();
            if c == Some('\n') {
                self.line += 1;
            }
            c
        }

        fn skip_whitespace_and_comments(&mut self) {
            while let Some(&c) = self.chars.peek() {
                match c {
                    ';' => {
                        while let Some(c) = self.advance() {
                            if c == '\n' {
                                break;
                            }
                        }
                    }
                    c if c.is_whitespace() => {
                        self.advance();
                    }
                    _ => break,
                }
            }
        }

        fn next_token(&mut self) -> Result<Option<Token>, LexError> {
            self.skip_whitespace_and_comments();

            let line = self.line;
            let Some(c) = self.advance() else {
                return Ok(None);
            };

            let kind = match c {
                // Brackets are interchangeable with parentheses
                '(' | '[' => TokenKind::LParen,
                ')' | ']' => TokenKind::RParen,
                '\'' => TokenKind::Quote,
                '"' => self.string(line)?,
                first => self.atom(first)?,
            };

            Ok(Some(Token { kind, line }))
        }

        fn string(
            &mut self,
            line: usize,
        ) -> Result<TokenKind, LexError> {
            let mut text = String::new();
            loop {
                match self.advance() {
                    None => return Err(LexError::UnterminatedString { line }),
                    Some('"') => return Ok(TokenKind::Str(text)),
                    Some('\\') => {
                        let escaped = match self.advance() {
                            None => return Err(LexError::UnterminatedString { line }),
                            Some('n') => '\n',
                            Some('t') => '\t',
                            Some('r') => '\r',
                            Some('\\') => '\\',
                            Some('"') => '"',
                            Some(ch) => return Err(LexError::InvalidEscape { ch }),
                        };
                        text.push(escaped);
                    }
                    Some(c) => text.push(c),
                }
            }
        }

        fn atom(
            &mut self,
            first: char,
        ) -> Result<TokenKind, LexError> {
            let mut text = String::from(first);
            while let Some(&c) = self.chars.peek() {
                if c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '\'' | '"' | ';') {
                    break;
                }
                text.push(c);
                self.advance();
            }
            classify(text)
        }
    }

    fn classify(text: String) -> Result<TokenKind, LexError> {
        if text == "." {
            return Ok(TokenKind::Dot);
        }
        if let Some(n) = Rational::parse(&text) {
            return Ok(TokenKind::Number(n));
        }
        if looks_numeric(&text) {
            return Err(LexError::InvalidNumber(text));
        }

        Ok(match text.to_ascii_lowercase().as_str() {
            "true" | "#t" => TokenKind::Bool(true),
            "false" | "#f" => TokenKind::Bool(false),
            "nil" => TokenKind::Nil,
            _ => TokenKind::Symbol(text),
        })
    }

    /// Numbers can start with `.`, `-` or `+`, but those alone are symbols.
    fn looks_numeric(text: &str) -> bool {
        let mut chars = text.chars();
        match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('-' | '+' | '.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }
}
