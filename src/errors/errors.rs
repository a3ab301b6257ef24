use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// Whether the caller is expected to substitute an opaque fallback
    /// instead of aborting the whole generation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::UnsupportedConstruct { .. } | ErrorImpl::RecursionGuardTripped { .. }
        )
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::InconsistentIndentation { .. } => "InconsistentIndentation",
            ErrorImpl::UnsupportedConstruct { .. } => "UnsupportedConstruct",
            ErrorImpl::RecursionGuardTripped { .. } => "RecursionGuardTripped",
            ErrorImpl::MalformedTemplateText { .. } => "MalformedTemplateText",
            ErrorImpl::FunctionNotFound { .. } => "FunctionNotFound",
            ErrorImpl::UnreadableFile { .. } => "UnreadableFile",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => {
                ErrorTip::Suggestion(format!("Invalid number literal: `{}`", token))
            }
            ErrorImpl::InconsistentIndentation { width } => ErrorTip::Suggestion(format!(
                "Dedent to column {} does not match any enclosing block",
                width
            )),
            ErrorImpl::UnsupportedConstruct { construct } => ErrorTip::Suggestion(format!(
                "`{}` expressions cannot be typed, substitute a placeholder",
                construct
            )),
            ErrorImpl::RecursionGuardTripped { depth } => ErrorTip::Suggestion(format!(
                "Resolution of local definitions stopped at depth {}",
                depth
            )),
            ErrorImpl::MalformedTemplateText { message } => ErrorTip::Suggestion(format!(
                "Generated template text is malformed: {}",
                message
            )),
            ErrorImpl::FunctionNotFound { function } => {
                ErrorTip::Suggestion(format!("No function named `{}` in this file", function))
            }
            ErrorImpl::UnreadableFile { path, message } => {
                ErrorTip::Suggestion(format!("Could not read `{}`: {}", path, message))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}:{}", self.internal_error, self.position.1, self.position.0)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("inconsistent indentation (width {width})")]
    InconsistentIndentation { width: usize },
    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },
    #[error("recursion guard tripped at depth {depth}")]
    RecursionGuardTripped { depth: usize },
    #[error("malformed template text: {message}")]
    MalformedTemplateText { message: String },
    #[error("function {function:?} not found")]
    FunctionNotFound { function: String },
    #[error("cannot read {path:?}: {message}")]
    UnreadableFile { path: String, message: String },
}
