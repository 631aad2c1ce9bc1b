//! REPL Command Handler
//!
//! Handles meta commands starting with ':'. They are only recognised at the
//! primary prompt; inside a multi-line expression a leading ':' is input.

/// Command result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Exit the REPL
    Exit,
    /// Discard pending input and reset the evaluator
    Clear,
    /// Output lines
    Output(Vec<String>),
}

const HELP: &[&str] = &[
    "Available commands:",
    "  :quit, :q      - Exit the REPL",
    "  :help, :h      - Show this help",
    "  :clear, :c     - Discard pending input and reset the evaluator",
    "Ctrl-C interrupts the current input; Ctrl-D exits.",
];

/// Handle a command; `None` if `line` is not a command
pub fn handle(line: &str) -> Option<CommandResult> {
    let cmd = line.trim().strip_prefix(':')?.trim();
    let name = cmd.split_whitespace().next().unwrap_or("");

    Some(match name {
        "quit" | "q" | "exit" => CommandResult::Exit,
        "help" | "h" => CommandResult::Output(HELP.iter().map(|s| s.to_string()).collect()),
        "clear" | "c" => CommandResult::Clear,
        _ => CommandResult::Output(vec![format!("Unknown command: {}", line.trim())]),
    })
}
