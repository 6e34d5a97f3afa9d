//! Error types and error handling for the compiler.
//!
//! This module defines the diagnostics produced by semantic analysis and
//! the internal failures of the compiler itself. It includes:
//!
//! - Diagnostic structures with source line information
//! - Severity classes and their mapping to process exit codes
//! - The accumulated per-run report and its text rendering
//! - Internal invariant violations, which are never shown as diagnostics

pub mod errors;
