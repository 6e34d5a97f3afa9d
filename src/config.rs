//! Compiler configuration.
//!
//! Target constants the analyzer and code generator read instead of
//! hard-coding them. `CompilerConfig::default()` describes the 32-bit ARM
//! target with the AAPCS calling convention.

use crate::compiler::instructions::Register;

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// First register of the expression-value window
    pub first_value_register: Register,
    /// Last register of the expression-value window; spilling starts past it
    pub last_value_register: Register,
    /// Register receiving a value popped back from a spill
    pub scratch_register: Register,
    /// Largest amount a single `ADD`/`SUB sp` may carry
    pub stack_adjust_limit: i32,
    /// Smallest literal folded into an instruction (exclusive)
    pub min_immediate: i64,
    /// Largest literal folded into an instruction (inclusive)
    pub max_immediate: i64,
    /// Label of the entry routine
    pub entry_label: String,
    pub exit_codes: ExitCodes,
}

/// Process exit codes reported for each run classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes {
    pub success: i32,
    pub syntactic: i32,
    pub semantic: i32,
    pub runtime: i32,
}

impl Default for ExitCodes {
    fn default() -> Self {
        ExitCodes {
            success: 0,
            syntactic: 100,
            semantic: 200,
            runtime: 255,
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            first_value_register: Register::R4,
            last_value_register: Register::R10,
            scratch_register: Register::R11,
            stack_adjust_limit: 1024,
            min_immediate: -255,
            max_immediate: 255,
            entry_label: String::from("main"),
            exit_codes: ExitCodes::default(),
        }
    }
}

impl CompilerConfig {
    /// Whether `value` can be encoded directly as an instruction's second operand.
    pub fn fits_immediate(&self, value: i64) -> bool {
        value > self.min_immediate && value <= self.max_immediate
    }
}
