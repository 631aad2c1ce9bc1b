//! End-to-end session tests over a scripted terminal

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lisp_session::backends::repl::terminal::{ScriptStep, Transcript};
use lisp_session::backends::repl::{
    spawn_thread, LispBackend, ReplBackend, ScriptedTerminal, Session, SessionError,
    SessionOptions, WorkerFactory,
};

fn lisp_worker() -> WorkerFactory {
    Box::new(|| spawn_thread(LispBackend::new))
}

async fn run_script(
    steps: Vec<ScriptStep>,
    spawn_worker: WorkerFactory,
) -> (Result<(), SessionError>, Transcript) {
    let terminal = ScriptedTerminal::new(steps);
    let transcript = terminal.transcript();
    let mut session = Session::new(terminal, SessionOptions::default(), spawn_worker).unwrap();
    let result = session.run().await;
    session.dispose().await;
    let transcript = transcript.lock().clone();
    (result, transcript)
}

async fn run_lines(lines: &[&str]) -> Transcript {
    let steps = lines.iter().map(|line| ScriptStep::line(line)).collect();
    let (result, transcript) = run_script(steps, lisp_worker()).await;
    result.unwrap();
    transcript
}

/// Echoes each line back after a delay; every line is complete on its own.
struct SlowEcho {
    delay: Duration,
    line: String,
}

impl ReplBackend for SlowEcho {
    type Error = String;

    fn push_line(
        &mut self,
        line: &str,
    ) -> Result<bool, String> {
        self.line = line.to_string();
        Ok(true)
    }

    fn buffered_lines(&self) -> usize {
        0
    }

    fn eval(&mut self) -> Result<String, String> {
        std::thread::sleep(self.delay);
        Ok(std::mem::take(&mut self.line))
    }

    fn reset(&mut self) {
        self.line.clear();
    }
}

/// Backend whose worker thread dies on the line `die`
struct Fragile;

impl ReplBackend for Fragile {
    type Error = String;

    fn push_line(
        &mut self,
        line: &str,
    ) -> Result<bool, String> {
        if line == "die" {
            panic!("worker killed");
        }
        Ok(true)
    }

    fn buffered_lines(&self) -> usize {
        0
    }

    fn eval(&mut self) -> Result<String, String> {
        Ok("ok".to_string())
    }

    fn reset(&mut self) {}
}

#[tokio::test]
async fn test_single_value() {
    let transcript = run_lines(&["1"]).await;
    assert_eq!(transcript.output, vec!["1"]);
    assert_eq!(transcript.prompts, vec!["> ", "> "]);
    assert!(transcript.disposed);
}

#[tokio::test]
async fn test_multi_line_accumulation() {
    let transcript = run_lines(&["(+ 1", "2)"]).await;
    assert_eq!(transcript.output, vec!["3"]);
    assert_eq!(transcript.prompts, vec!["> ", ". ", "> "]);
}

#[tokio::test]
async fn test_empty_list_across_lines() {
    let transcript = run_lines(&["(", ")"]).await;
    assert_eq!(transcript.output, vec!["()"]);
    assert_eq!(transcript.prompts, vec!["> ", ". ", "> "]);
}

#[tokio::test]
async fn test_error_resets_to_primary_prompt() {
    let transcript = run_lines(&["(car", "'())", "(+ 2 2)"]).await;
    assert_eq!(
        transcript.output,
        vec!["Error: car called on empty list", "4"]
    );
    assert_eq!(transcript.prompts, vec!["> ", ". ", "> ", "> "]);
}

#[tokio::test]
async fn test_unbalanced_close_is_reported() {
    let transcript = run_lines(&[")", "7"]).await;
    assert_eq!(transcript.output, vec!["Error: Unexpected ')'", "7"]);
}

#[tokio::test]
async fn test_deeply_nested_input_is_rejected() {
    let deep = format!("'{}{}", "(".repeat(300_000), ")".repeat(300_000));
    let transcript = run_lines(&[deep.as_str(), "(+ 1 2)"]).await;
    assert_eq!(
        transcript.output,
        vec!["Error: Expression nested deeper than 512 levels", "3"]
    );
    assert_eq!(transcript.prompts, vec!["> ", "> ", "> "]);
}

#[tokio::test]
async fn test_definitions_persist() {
    let transcript = run_lines(&["(define (sq x)", "  (* x x))", "", "(sq 12)"]).await;
    assert_eq!(transcript.output, vec!["144"]);
    assert_eq!(transcript.prompts, vec!["> ", ". ", "> ", "> ", "> "]);
}

#[tokio::test]
async fn test_meta_commands() {
    let transcript = run_lines(&[":help", "(+ 1", ":clear)", ":quit", "6"]).await;
    assert!(transcript.output[0].starts_with("Available commands"));
    // ":clear" inside an expression is ordinary input.
    assert_eq!(
        transcript.output.last().map(String::as_str),
        Some("Error: Symbol :clear not found")
    );
    assert!(!transcript.output.contains(&"6".to_string()));
}

#[tokio::test]
async fn test_clear_at_primary_prompt() {
    let transcript = run_lines(&[":clear", "1"]).await;
    assert_eq!(transcript.output, vec!["1"]);
}

#[tokio::test]
async fn test_interrupt_during_continuation() {
    let steps = vec![
        ScriptStep::line("(+ 1"),
        ScriptStep::interrupt(),
        ScriptStep::line("2)"),
        ScriptStep::line("(+ 2 3)"),
    ];
    let (result, transcript) = run_script(steps, lisp_worker()).await;
    result.unwrap();
    // "2)" starts a fresh expression and is unbalanced.
    assert_eq!(transcript.output, vec!["Error: Unexpected ')'", "5"]);
}

#[tokio::test]
async fn test_interrupt_while_evaluating_discards_late_result() {
    let steps = vec![
        ScriptStep::line("slow"),
        ScriptStep::interrupt(),
        ScriptStep::line("fast"),
    ];
    let spawn: WorkerFactory = Box::new(|| {
        spawn_thread(|| SlowEcho {
            delay: Duration::from_millis(200),
            line: String::new(),
        })
    });
    let (result, transcript) = run_script(steps, spawn).await;
    result.unwrap();
    assert_eq!(transcript.output, vec!["fast"]);
}

#[tokio::test]
async fn test_lost_worker_is_respawned() {
    let spawned = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&spawned);
    let spawn: WorkerFactory = Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        spawn_thread(|| Fragile)
    });

    let steps = vec![ScriptStep::line("die"), ScriptStep::line("hello")];
    let (result, transcript) = run_script(steps, spawn).await;
    result.unwrap();

    assert_eq!(spawned.load(Ordering::SeqCst), 2);
    assert_eq!(
        transcript.output,
        vec!["Error: evaluator lost: worker exited", "ok"]
    );
}

#[tokio::test]
async fn test_gives_up_after_max_restarts() {
    let steps = vec![
        ScriptStep::line("die"),
        ScriptStep::line("die"),
        ScriptStep::line("die"),
        ScriptStep::line("die"),
        ScriptStep::line("never"),
    ];
    let spawn: WorkerFactory = Box::new(|| spawn_thread(|| Fragile));
    let (result, _) = run_script(steps, spawn).await;
    assert!(matches!(
        result,
        Err(SessionError::WorkerLost { restarts: 4 })
    ));
}
