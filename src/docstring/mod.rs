//! Google-style docstring layout built from resolved types.

pub mod docstring;

#[cfg(test)]
mod tests;
