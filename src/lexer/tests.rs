//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Numeric and string literals (prefixes, triple quotes)
//! - Operators and punctuation
//! - Indentation and implicit line joining
//! - Error cases

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.py".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "def class return yield raise import from as lambda True False None".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Def);
    assert_eq!(tokens[1].kind, TokenKind::Class);
    assert_eq!(tokens[2].kind, TokenKind::Return);
    assert_eq!(tokens[3].kind, TokenKind::Yield);
    assert_eq!(tokens[4].kind, TokenKind::Raise);
    assert_eq!(tokens[5].kind, TokenKind::Import);
    assert_eq!(tokens[6].kind, TokenKind::From);
    assert_eq!(tokens[7].kind, TokenKind::As);
    assert_eq!(tokens[8].kind, TokenKind::Lambda);
    assert_eq!(tokens[9].kind, TokenKind::True);
    assert_eq!(tokens[10].kind, TokenKind::False);
    assert_eq!(tokens[11].kind, TokenKind::None);
    assert_eq!(tokens[12].kind, TokenKind::Newline);
    assert_eq!(tokens[13].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar_123 _private CamelCase rb".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    let values: Vec<&str> = tokens[..5].iter().map(|token| token.value.as_str()).collect();
    assert_eq!(values, vec!["foo", "bar_123", "_private", "CamelCase", "rb"]);
    assert!(tokens[..5].iter().all(|token| token.kind == TokenKind::Identifier));
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 3.14 .5 1e10 0xFF 2j 1_000".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    let values: Vec<&str> = tokens[..7].iter().map(|token| token.value.as_str()).collect();
    assert_eq!(values, vec!["42", "3.14", ".5", "1e10", "0xFF", "2j", "1_000"]);
    assert!(tokens[..7].iter().all(|token| token.kind == TokenKind::Number));
}

#[test]
fn test_tokenize_strings_keep_prefix_and_quotes() {
    let source = r#"'a' "b" b'raw' f"{x}" r'\d'"#.to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[0].value, "'a'");
    assert_eq!(tokens[1].value, "\"b\"");
    assert_eq!(tokens[2].value, "b'raw'");
    assert_eq!(tokens[3].value, "f\"{x}\"");
    assert_eq!(tokens[4].value, "r'\\d'");
    assert!(tokens[..5].iter().all(|token| token.kind == TokenKind::String));
}

#[test]
fn test_tokenize_triple_quoted_string_spans_lines() {
    let source = "x = \"\"\"first\nsecond\"\"\"\ny = 1\n".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[2].kind, TokenKind::String);
    assert_eq!(tokens[2].value, "\"\"\"first\nsecond\"\"\"");
    assert_eq!(tokens[3].kind, TokenKind::Newline);
    assert_eq!(tokens[4].value, "y");
}

#[test]
fn test_tokenize_operators_longest_first() {
    assert_eq!(
        kinds("a ** b // c -> ... == != <= >= += **="),
        vec![
            TokenKind::Identifier,
            TokenKind::Power,
            TokenKind::Identifier,
            TokenKind::DoubleSlash,
            TokenKind::Identifier,
            TokenKind::Arrow,
            TokenKind::Ellipsis,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::PlusEquals,
            TokenKind::PowerEquals,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_comments_are_skipped() {
    assert_eq!(
        kinds("x = 1  # trailing\n# whole line\n"),
        vec![
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_indentation() {
    let source = "def f():\n    return 1\n\nx = 2\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Def,
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Return,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_closes_open_blocks_at_eof() {
    let tokens = kinds("if a:\n    if b:\n        pass");
    let dedents = tokens.iter().filter(|kind| **kind == TokenKind::Dedent).count();

    assert_eq!(dedents, 2);
    assert_eq!(tokens.last(), Some(&TokenKind::EOF));
}

#[test]
fn test_tokenize_newlines_inside_brackets_are_ignored() {
    let tokens = kinds("x = [\n    1,\n    2,\n]\n");
    let newlines = tokens.iter().filter(|kind| **kind == TokenKind::Newline).count();

    assert_eq!(newlines, 1);
    assert!(!tokens.contains(&TokenKind::Indent));
}

#[test]
fn test_tokenize_line_continuation() {
    let tokens = kinds("x = 1 + \\\n    2\n");
    assert!(!tokens.contains(&TokenKind::Indent));
    assert_eq!(tokens.iter().filter(|kind| **kind == TokenKind::Newline).count(), 1);
}

#[test]
fn test_tokenize_inconsistent_dedent_fails() {
    let result = tokenize("if a:\n        x = 1\n    y = 2\n".to_string(), Some("test.py".to_string()));

    let error = result.err().unwrap();
    assert_eq!(error.get_error_name(), "InconsistentIndentation");
}

#[test]
fn test_tokenize_unrecognised_token() {
    let result = tokenize("x = $".to_string(), Some("test.py".to_string()));

    let error = result.err().unwrap();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 4);
}

#[test]
fn test_token_spans_are_byte_offsets() {
    let tokens = tokenize("foo = 'bar'".to_string(), None).unwrap();

    assert_eq!(tokens[2].span.start.0, 6);
    assert_eq!(tokens[2].span.end.0, 11);
    assert_eq!(*tokens[2].span.start.1, "<string>");
}
