//! Error types and error handling.
//!
//! This module defines the single error type shared by every stage:
//!
//! - Front-end errors (tokenizing and parsing source text)
//! - Resolution errors (unsupported constructs, the recursion guard)
//! - Template errors (unbalanced placeholder text)
//!
//! Every error carries a source position and a short suggestion.

pub mod errors;

#[cfg(test)]
mod tests;
