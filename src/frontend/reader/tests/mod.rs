//! Reader unit tests

use crate::frontend::reader::{read, read_with_max_depth, Reader};
use crate::runtime::{LispError, Value};

fn sym(name: &str) -> Value {
    Value::symbol(name)
}

#[cfg(test)]
mod reader_completeness_tests {
    use super::*;

    #[test]
    fn test_single_atom_is_complete() {
        let mut reader = Reader::new();
        assert!(reader.push_line("1").unwrap());
        assert_eq!(reader.lines(), 1);
    }

    #[test]
    fn test_open_paren_waits_for_more() {
        let mut reader = Reader::new();
        assert!(!reader.push_line("(+ 1").unwrap());
        assert!(!reader.is_complete());
        assert!(reader.push_line("2)").unwrap());
        assert_eq!(reader.lines(), 2);
    }

    #[test]
    fn test_split_does_not_matter() {
        let mut whole = Reader::new();
        assert!(whole.push_line("(define (f x) (* x x))").unwrap());

        let mut parts = Reader::new();
        assert!(!parts.push_line("(define").unwrap());
        assert!(!parts.push_line("  (f x)").unwrap());
        assert!(parts.push_line("  (* x x))").unwrap());

        assert_eq!(whole.take().unwrap(), parts.take().unwrap());
    }

    #[test]
    fn test_paren_inside_string_is_ignored() {
        let mut reader = Reader::new();
        assert!(reader.push_line("\"(\"").unwrap());
    }

    #[test]
    fn test_open_string_waits_for_more() {
        let mut reader = Reader::new();
        assert!(!reader.push_line("(list \"abc").unwrap());
        assert!(reader.push_line("def\")").unwrap());
        let exps = reader.take().unwrap();
        assert_eq!(
            exps,
            vec![Value::List(vec![sym("list"), Value::Str("abc\ndef".into())])]
        );
    }

    #[test]
    fn test_dangling_quote_waits_for_datum() {
        let mut reader = Reader::new();
        assert!(!reader.push_line("'").unwrap());
        assert!(reader.push_line("x").unwrap());
    }

    #[test]
    fn test_comment_only_is_complete() {
        let mut reader = Reader::new();
        assert!(reader.push_line("; nothing here").unwrap());
        assert_eq!(reader.take().unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_unexpected_close_leaves_buffer_untouched() {
        let mut reader = Reader::new();
        assert!(!reader.push_line("(a").unwrap());
        assert_eq!(reader.push_line("))"), Err(LispError::UnexpectedClose));
        assert_eq!(reader.lines(), 1);
        assert!(reader.push_line(")").unwrap());
    }

    #[test]
    fn test_take_resets_reader() {
        let mut reader = Reader::new();
        reader.push_line("(a b)").unwrap();
        reader.take().unwrap();
        assert!(reader.is_empty());
        assert!(!reader.is_complete());
        assert_eq!(reader.lines(), 0);
    }

    #[test]
    fn test_clear() {
        let mut reader = Reader::new();
        reader.push_line("(a").unwrap();
        reader.clear();
        assert!(reader.is_empty());
        assert!(reader.push_line("b").unwrap());
    }
}

#[cfg(test)]
mod reader_parse_tests {
    use super::*;

    #[test]
    fn test_read_multiple_expressions() {
        assert_eq!(
            read("1 foo \"s\"").unwrap(),
            vec![Value::number(1), sym("foo"), Value::Str("s".into())]
        );
    }

    #[test]
    fn test_read_nested_list() {
        assert_eq!(
            read("(a (b c) ())").unwrap(),
            vec![Value::List(vec![
                sym("a"),
                Value::List(vec![sym("b"), sym("c")]),
                Value::List(vec![]),
            ])]
        );
    }

    #[test]
    fn test_read_quote() {
        assert_eq!(
            read("'(1 2)").unwrap(),
            vec![Value::List(vec![
                sym("quote"),
                Value::List(vec![Value::number(1), Value::number(2)]),
            ])]
        );
    }

    #[test]
    fn test_read_dotted_pair() {
        assert_eq!(
            read("(a . b)").unwrap(),
            vec![Value::Dotted(vec![sym("a")], Box::new(sym("b")))]
        );
    }

    #[test]
    fn test_dotted_list_tail_is_flattened() {
        assert_eq!(
            read("(a . (b c))").unwrap(),
            vec![Value::List(vec![sym("a"), sym("b"), sym("c")])]
        );
    }

    #[test]
    fn test_read_errors() {
        assert_eq!(read("(a"), Err(LispError::UnexpectedEof));
        assert_eq!(read(")"), Err(LispError::UnexpectedClose));
        assert!(matches!(read("(. a)"), Err(LispError::Syntax(_))));
        assert!(matches!(read("(a . b c)"), Err(LispError::Syntax(_))));
        assert!(matches!(read("."), Err(LispError::Syntax(_))));
    }
}

#[cfg(test)]
mod reader_nesting_tests {
    use super::*;

    fn nested(depth: usize) -> String {
        format!("{}{}", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn test_deep_open_parens_rejected_while_typing() {
        let mut reader = Reader::with_max_depth(16);
        assert!(!reader.push_line(&"(".repeat(16)).unwrap());
        assert_eq!(reader.push_line("("), Err(LispError::TooDeep(16)));
        assert_eq!(reader.lines(), 1);
    }

    #[test]
    fn test_stacked_quotes_count_as_nesting() {
        let quoted = format!("{}x", "'".repeat(20));
        assert_eq!(read_with_max_depth(&quoted, 16), Err(LispError::TooDeep(16)));
        assert_eq!(read_with_max_depth(&quoted, 32).unwrap().len(), 1);

        let mut reader = Reader::with_max_depth(16);
        assert!(reader.push_line(&quoted).unwrap());
        assert_eq!(reader.take(), Err(LispError::TooDeep(16)));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_huge_nesting_fails_without_overflowing() {
        let source = format!("'{}", nested(300_000));
        assert_eq!(read(&source), Err(LispError::TooDeep(crate::runtime::DEFAULT_MAX_DEPTH)));

        let mut reader = Reader::new();
        assert!(reader.push_line(&source).is_err());
        assert!(reader.is_empty());
        assert!(reader.push_line("(+ 1 2)").unwrap());
    }

    #[test]
    fn test_nesting_within_limit_reads() {
        let exps = read_with_max_depth(&nested(16), 16).unwrap();
        assert_eq!(exps.len(), 1);
    }
}
