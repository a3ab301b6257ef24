//! Type resolution: turns an expression and the scope it appears in into
//! deduplicated type descriptors.
//!
//! References (calls, attributes and names) go through an ordered chain of
//! strategies; see [`strategies::standard_strategies`].

pub mod builtins;
pub mod context;
pub mod descriptor;
pub mod resolver;
pub mod strategies;
