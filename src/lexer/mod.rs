//! Lexical analysis module.
//!
//! This module contains the lexer (tokenizer) that converts Python source
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization using anchored regex patterns tried in order
//! - Recognition of keywords, identifiers, literals, and operators
//! - Indentation tracking (`Indent`/`Dedent`/`Newline` layout tokens)
//! - Implicit line joining inside brackets, comments and continuations

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
