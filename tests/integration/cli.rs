//! Command-line tests against the built binary

use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_lisp-session");

fn lisp_session(args: &[&str]) -> Command {
    let mut command = Command::new(BIN);
    command.args(args).env_remove("LISP_SESSION_LOG");
    command
}

fn piped_repl(input: &str) -> Output {
    let mut child = lisp_session(&["repl"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_eval_subcommand() {
    let output = lisp_session(&["eval", "(* 6 7)"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "42\n");
}

#[test]
fn test_eval_subcommand_error() {
    let output = lisp_session(&["eval", "(car 5)"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to evaluate code"));
}

#[test]
fn test_run_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prog.lisp");
    fs::write(&path, "(define n 10)\n(* n n)\n").unwrap();

    let output = lisp_session(&["run", path.to_str().unwrap()]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "100\n");
}

#[test]
fn test_version_subcommand() {
    let output = lisp_session(&["version"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("lisp-session "));
}

#[test]
fn test_piped_repl() {
    let output = piped_repl("(+ 1\n   2)\n(car '())\n:help\n\"a\"\n");
    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "3");
    assert_eq!(lines[1], "Error: car called on empty list");
    assert_eq!(lines[2], "Available commands:");
    assert_eq!(lines.last(), Some(&"\"a\""));
}

#[test]
fn test_piped_repl_process_isolation() {
    let mut child = lisp_session(&["--isolation", "process", "repl"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"(define (f x)\n  (+ x 1))\n(f 41)\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "42\n");
}

#[test]
fn test_piped_repl_invalid_utf8() {
    let mut child = lisp_session(&["repl"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"\"caf\xff\"\n(+ 1 1)\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.ends_with("2\n"));
}

#[test]
fn test_config_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[session]\nisolation = \"thread\"\nmax_restarts = 1\n").unwrap();

    let mut child = lisp_session(&["--config", path.to_str().unwrap(), "repl"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"(list 1 2)\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "(1 2)\n");
}

#[test]
fn test_configured_depth_bounds_eval_and_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[session]\nmax_eval_depth = 10\n").unwrap();
    let program = "(define (count n) (if (= n 0) 0 (+ 1 (count (- n 1))))) (count 50)";
    let file = dir.path().join("count.lisp");
    fs::write(&file, program).unwrap();

    let output = lisp_session(&["eval", program]).output().unwrap();
    assert_eq!(stdout(&output), "50\n");

    let config = config.to_str().unwrap();
    let output = lisp_session(&["--config", config, "eval", program]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Recursion limit of 10 exceeded"));

    let output = lisp_session(&["--config", config, "run", file.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Recursion limit of 10 exceeded"));
}

#[test]
fn test_bad_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[session\n").unwrap();

    let output = lisp_session(&["--config", path.to_str().unwrap(), "eval", "1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load configuration"));
}
