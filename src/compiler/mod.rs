//! Code generation module for the compiler.
//!
//! This module turns the typed tree of a successfully checked program into
//! 32-bit ARM assembly. It handles:
//!
//! - Lowering of expressions into a window of value registers
//! - Lowering of statements, scopes and function frames
//! - The runtime support routines generated code calls into
//! - The instruction model and its textual rendering

pub mod compiler;
pub mod expr;
pub mod instructions;
pub mod stdlib;
pub mod stmt;
