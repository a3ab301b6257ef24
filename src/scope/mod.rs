//! Scope model: the module, class and function scopes of a parsed source
//! unit, the exits and assignments collected for each, and the unit's
//! import bindings.

pub mod scope;

#[cfg(test)]
mod tests;
