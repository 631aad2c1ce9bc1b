//! Reader: accumulates input lines and parses complete expressions
//!
//! The [`Reader`] answers one question for the REPL: after this line, does
//! the buffer hold complete expressions, or should the user keep typing?
//! It re-scans the whole buffer on every push, so the answer never depends
//! on how the input was split into lines.
//!
//! Nesting is capped at the evaluator's depth limit. Parsing and printing
//! recurse on it, so unbounded input would exhaust the stack.

#[cfg(test)]
mod tests;

use crate::frontend::lexer::{tokenize, LexError, Token, TokenKind};
use crate::runtime::errors::{LispError, LispResult};
use crate::runtime::{Value, DEFAULT_MAX_DEPTH};

/// Line accumulator for one multi-line expression
#[derive(Debug, Clone)]
pub struct Reader {
    source: String,
    lines: usize,
    complete: bool,
    max_depth: usize,
}

impl Default for Reader {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl Reader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader rejecting expressions nested deeper than `max_depth`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            source: String::new(),
            lines: 0,
            complete: false,
            max_depth,
        }
    }

    /// Append one line and report whether the buffer is now complete.
    ///
    /// An unbalanced `)`, a malformed literal or too deep a nesting is an
    /// error; the buffer is left as it was before the call so the caller can
    /// decide to clear it.
    pub fn push_line(
        &mut self,
        line: &str,
    ) -> LispResult<bool> {
        let previous = self.source.len();
        self.source.push_str(line);
        self.source.push('\n');

        match scan(&self.source, self.max_depth) {
            Ok(complete) => {
                self.lines += 1;
                self.complete = complete;
                Ok(complete)
            }
            Err(err) => {
                self.source.truncate(previous);
                Err(err)
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of lines accepted since the last clear
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Parse the buffered source and reset the reader
    pub fn take(&mut self) -> LispResult<Vec<Value>> {
        let source = std::mem::take(&mut self.source);
        self.clear();
        read_with_max_depth(&source, self.max_depth)
    }

    pub fn clear(&mut self) {
        self.source.clear();
        self.lines = 0;
        self.complete = false;
    }
}

/// Completeness of `source`: balanced parentheses, no open string and no
/// quote still waiting for its datum.
fn scan(
    source: &str,
    max_depth: usize,
) -> LispResult<bool> {
    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(LexError::UnterminatedString { .. }) => return Ok(false),
        Err(err) => return Err(err.into()),
    };

    let mut depth: usize = 0;
    for token in &tokens {
        match token.kind {
            TokenKind::LParen => {
                depth += 1;
                if depth > max_depth {
                    return Err(LispError::TooDeep(max_depth));
                }
            }
            TokenKind::RParen => {
                depth = depth.checked_sub(1).ok_or(LispError::UnexpectedClose)?;
            }
            _ => {}
        }
    }

    let dangling_quote = matches!(tokens.last(), Some(Token { kind: TokenKind::Quote, .. }));
    Ok(depth == 0 && !dangling_quote)
}

/// Parse every expression in `source`
pub fn read(source: &str) -> LispResult<Vec<Value>> {
    read_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parse every expression in `source`, nesting at most `max_depth` levels
pub fn read_with_max_depth(
    source: &str,
    max_depth: usize,
) -> LispResult<Vec<Value>> {
    let tokens = tokenize(source)?;
    parse_all(&tokens, max_depth)
}

/// Parse a token stream into a sequence of expressions.
///
/// Lists and quotes each count as one level; exceeding `max_depth` is
/// [`LispError::TooDeep`].
pub fn parse_all(
    tokens: &[Token],
    max_depth: usize,
) -> LispResult<Vec<Value>> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let mut exps = Vec::new();
    while parser.pos < tokens.len() {
        exps.push(parser.expr()?);
    }
    Ok(exps)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> LispResult<&'a TokenKind> {
        let tokens = self.tokens;
        let token = tokens.get(self.pos).ok_or(LispError::UnexpectedEof)?;
        self.pos += 1;
        Ok(&token.kind)
    }

    fn peek(&self) -> Option<&'a TokenKind> {
        let tokens = self.tokens;
        tokens.get(self.pos).map(|t| &t.kind)
    }

    fn expr(&mut self) -> LispResult<Value> {
        if self.depth >= self.max_depth {
            return Err(LispError::TooDeep(self.max_depth));
        }
        self.depth += 1;
        let value = self.datum();
        self.depth -= 1;
        value
    }

    fn datum(&mut self) -> LispResult<Value> {
        Ok(match self.next()? {
            TokenKind::LParen => return self.list(),
            TokenKind::RParen => return Err(LispError::UnexpectedClose),
            TokenKind::Dot => return Err(LispError::Syntax("unexpected '.'".to_string())),
            TokenKind::Quote => {
                let datum = self.expr()?;
                Value::List(vec![Value::symbol("quote"), datum])
            }
            TokenKind::Number(n) => Value::Number(*n),
            TokenKind::Str(s) => Value::Str(s.clone()),
            TokenKind::Bool(b) => Value::Bool(*b),
            TokenKind::Nil => Value::Nil,
            TokenKind::Symbol(s) => Value::Symbol(s.clone()),
        })
    }

    fn list(&mut self) -> LispResult<Value> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(LispError::UnexpectedEof),
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    return Ok(Value::List(items));
                }
                Some(TokenKind::Dot) => {
                    self.pos += 1;
                    if items.is_empty() {
                        return Err(LispError::Syntax("'.' needs a preceding item".to_string()));
                    }
                    let tail = self.expr()?;
                    match self.next()? {
                        TokenKind::RParen => return Ok(dotted(items, tail)),
                        _ => {
                            return Err(LispError::Syntax(
                                "expected ')' after dotted tail".to_string(),
                            ))
                        }
                    }
                }
                Some(_) => items.push(self.expr()?),
            }
        }
    }
}

/// `(a . (b c))` is the proper list `(a b c)`; only a non-list tail stays dotted.
fn dotted(
    mut items: Vec<Value>,
    tail: Value,
) -> Value {
    match tail {
        Value::List(rest) => {
            items.extend(rest);
            Value::List(items)
        }
        Value::Dotted(rest, tail) => {
            items.extend(rest);
            Value::Dotted(items, tail)
        }
        other => Value::Dotted(items, Box::new(other)),
    }
}
