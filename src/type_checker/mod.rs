//! Type checking and semantic analysis module.
//!
//! This module checks the syntax tree handed over by the front-end and
//! builds the typed tree consumed by the code generator. It:
//!
//! - Resolves identifiers through chained scopes and lays out stack frames
//! - Registers every function signature before checking any body
//! - Resolves calls against overload sets
//! - Checks operand, assignment, condition and return types
//! - Folds binary operations over literals
//! - Collects every diagnostic instead of stopping at the first one

pub mod expr;
pub mod functions;
pub mod liveness;
pub mod scope;
pub mod type_checker;
pub mod typed_ast;
pub mod types;

#[cfg(test)]
mod tests;
