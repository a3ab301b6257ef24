/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the parsed source tree
///
/// Submodules:
/// - ast: Core AST definitions and traits
/// - expressions: Definitions for various expression types
/// - statements: Definitions for various statement types
pub mod ast;
pub mod expressions;
pub mod statements;
