//! Unit tests for error handling.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

fn at(offset: u32) -> Position {
    Position(offset, Rc::new("test.py".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        at(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 10);
}

#[test]
fn test_unrecognised_token_has_no_tip() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        at(0),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_unsupported_construct_is_recoverable() {
    let error = Error::new(
        ErrorImpl::UnsupportedConstruct {
            construct: "Lambda".to_string(),
        },
        at(4),
    );

    assert_eq!(error.get_error_name(), "UnsupportedConstruct");
    assert!(error.is_recoverable());
    assert!(error.get_tip().to_string().contains("Lambda"));
}

#[test]
fn test_malformed_template_is_not_recoverable() {
    let error = Error::new(
        ErrorImpl::MalformedTemplateText {
            message: "unclosed `{`".to_string(),
        },
        at(3),
    );

    assert_eq!(error.get_error_name(), "MalformedTemplateText");
    assert!(!error.is_recoverable());
}

#[test]
fn test_indentation_tip_names_width() {
    let error = Error::new(ErrorImpl::InconsistentIndentation { width: 3 }, at(12));

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains('3')),
        ErrorTip::None => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_error_display_includes_file_and_offset() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: ")".to_string(),
        },
        at(7),
    );

    assert_eq!(error.to_string(), "unexpected token: \")\" at test.py:7");
}

#[test]
fn test_unreadable_file_tip_names_path() {
    let error = Error::new(
        ErrorImpl::UnreadableFile {
            path: "missing.py".to_string(),
            message: "No such file or directory".to_string(),
        },
        at(0),
    );

    assert_eq!(error.get_error_name(), "UnreadableFile");
    assert!(!error.is_recoverable());
    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains("missing.py")),
        ErrorTip::None => panic!("Expected suggestion tip"),
    }
}
