//! REPL Completer
//!
//! Completes special forms and builtin procedure names.

use rustyline::completion::{Completer, Pair};
use rustyline::{Helper, Highlighter, Hinter, Validator};

use crate::backends::repl::engine::completion_words;

/// Characters that end a symbol
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '\'' | '"')
}

/// rustyline helper for the Lisp REPL
#[derive(Helper, Hinter, Highlighter, Validator)]
pub struct LispHelper {
    words: Vec<&'static str>,
}

impl Default for LispHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl LispHelper {
    pub fn new() -> Self {
        let mut words = completion_words();
        words.sort_unstable();
        words.dedup();
        Self { words }
    }

    /// Start of the word under the cursor and its candidates
    pub fn candidates(
        &self,
        line: &str,
        pos: usize,
    ) -> (usize, Vec<&'static str>) {
        let start = line[..pos]
            .rfind(is_delimiter)
            .map_or(0, |i| i + line[i..].chars().next().map_or(1, char::len_utf8));
        let word = &line[start..pos];
        if word.is_empty() {
            return (start, Vec::new());
        }

        let matches = self
            .words
            .iter()
            .copied()
            .filter(|candidate| candidate.starts_with(word))
            .collect();
        (start, matches)
    }
}

impl Completer for LispHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let (start, words) = self.candidates(line, pos);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}
