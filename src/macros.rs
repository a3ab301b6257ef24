//! Utility macros for the crate.
//!
//! This module defines helper macros used throughout the front-end:
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a default lexer handler for simple tokens
//! - `IMPL_EXPR!` - Implements the `Expr` trait for a cloneable node
//! - `IMPL_STMT!` - Implements the `Stmt` trait for a cloneable node
//!
//! These macros reduce boilerplate in the lexer and AST definitions.

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's string value
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, "42".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Creates a default lexer handler for simple single-token patterns.
///
/// Generates a handler function that creates a token with the given kind
/// and advances the lexer position by the token's length.
///
/// # Arguments
///
/// * `$kind` - The TokenKind to create
/// * `$value` - The literal string value (used for length calculation)
///
/// # Example
///
/// ```ignore
/// RegexPattern::new("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+"))
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| {
            let span = lexer.span_of($value.len());
            lexer.push(MK_TOKEN!($kind, String::from($value), span));
            lexer.advance_n($value.len());
        }
    };
}

/// Implements `Expr` for a node type that derives `Clone` and has a `span` field.
///
/// # Example
///
/// ```ignore
/// IMPL_EXPR!(NumberExpr, ExprType::Number);
/// ```
#[macro_export]
macro_rules! IMPL_EXPR {
    ($node:ty, $expr_type:expr) => {
        impl Expr for $node {
            fn get_expr_type(&self) -> ExprType {
                $expr_type
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn clone_wrapper(&self) -> ExprWrapper {
                ExprWrapper::new(self.clone())
            }
            fn get_span(&self) -> &$crate::Span {
                &self.span
            }
        }
    };
}

/// Implements `Stmt` for a node type that derives `Clone` and has a `span` field.
#[macro_export]
macro_rules! IMPL_STMT {
    ($node:ty, $stmt_type:expr) => {
        impl Stmt for $node {
            fn get_stmt_type(&self) -> StmtType {
                $stmt_type
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn clone_wrapper(&self) -> StmtWrapper {
                StmtWrapper::new(self.clone())
            }
            fn get_span(&self) -> &$crate::Span {
                &self.span
            }
        }
    };
}
