//! In-process evaluation tests

use std::fs;

use lisp_session::runtime::LispError;
use lisp_session::{eval_source, eval_source_with_depth, run_file, run_file_with_depth};

#[test]
fn test_eval_source_returns_last_value() {
    assert_eq!(eval_source("1 2 3").unwrap(), "3");
    assert_eq!(eval_source("").unwrap(), "");
    assert_eq!(eval_source("(define x 1)").unwrap(), "");
}

#[test]
fn test_eval_source_program() {
    let source = r#"
        ; list helpers
        (define (length xs) (if (null? xs) 0 (+ 1 (length (cdr xs)))))
        (define (map f xs)
          (if (null? xs)
              '()
              (cons (f (car xs)) (map f (cdr xs)))))
        (define (average . xs) (/ (apply + xs) (length xs)))
        (list (map (lambda (x) (* x x)) '(1 2 3)) (average 1 2))
    "#;
    assert_eq!(eval_source(source).unwrap(), "((1 4 9) 3/2)");
}

#[test]
fn test_eval_source_errors() {
    let err = eval_source("(+ 1").unwrap_err();
    assert_eq!(err.to_string(), "Unexpected EOF while parsing");

    let err = eval_source("(undefined-thing)").unwrap_err();
    assert_eq!(err.to_string(), "Symbol undefined-thing not found");
}

const COUNT_DOWN: &str = "(define (count n) (if (= n 0) 0 (+ 1 (count (- n 1))))) (count 50)";

#[test]
fn test_eval_source_with_depth() {
    assert_eq!(eval_source(COUNT_DOWN).unwrap(), "50");

    let err = eval_source_with_depth(COUNT_DOWN, 10).unwrap_err();
    assert_eq!(err.downcast_ref::<LispError>(), Some(&LispError::RecursionLimit(10)));

    let err = eval_source_with_depth("'((((((1))))))", 4).unwrap_err();
    assert_eq!(err.downcast_ref::<LispError>(), Some(&LispError::TooDeep(4)));
}

#[test]
fn test_run_file_with_depth() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("count.lisp");
    fs::write(&path, COUNT_DOWN).unwrap();
    assert_eq!(run_file_with_depth(&path, 512).unwrap(), "50");
    let err = run_file_with_depth(&path, 10).unwrap_err();
    assert!(err.to_string().contains("Failed to evaluate"));
}

#[test]
fn test_run_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fib.lisp");
    fs::write(
        &path,
        "(define (fib n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2)))))\n(fib 15)\n",
    )
    .unwrap();
    assert_eq!(run_file(&path).unwrap(), "610");
}

#[test]
fn test_run_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_file(&dir.path().join("nope.lisp")).unwrap_err();
    assert!(err.to_string().contains("Failed to read file"));
}
