/// AST (Abstract Syntax Tree) module
/// Contains the syntax tree handed over by the front-end
///
/// Submodules:
/// - ast: Program and function declarations
/// - expressions: Expression nodes and operators
/// - statements: Statement nodes
/// - types: Type annotations as written in the source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
