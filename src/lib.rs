#![allow(clippy::module_inception)]

use crate::{
    ast::ast::Program,
    compiler::{compiler::compile, instructions::Assembly},
    config::CompilerConfig,
    errors::errors::CompileFailure,
    type_checker::type_checker::type_check,
};

pub mod ast;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod type_checker;

/// A source line number, counted from 1. Line 0 means "no position".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position(pub u32);

impl Position {
    pub fn null() -> Self {
        Position(0)
    }
}

/// Line-number to source-text lookup supplied by the front-end.
pub trait SourceLines {
    fn line_text(&self, line: u32) -> Option<&str>;
}

/// In-memory source text, split once into lines.
#[derive(Debug, Clone, Default)]
pub struct SourceText {
    lines: Vec<String>,
}

impl SourceText {
    pub fn new(content: &str) -> Self {
        SourceText {
            lines: content
                .split_inclusive('\n')
                .map(|line| line.trim_end_matches(['\n', '\r']).to_string())
                .collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl SourceLines for SourceText {
    fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.lines.get(line as usize - 1).map(String::as_str)
    }
}

/// Runs semantic analysis and, when it produced no diagnostics, code generation.
///
/// # Arguments
///
/// * `program` - The syntax tree delivered by the front-end
/// * `config` - Target and exit-code constants
///
/// # Returns
///
/// The assembled module, or every diagnostic of the run (or an internal defect).
pub fn compile_program(program: &Program, config: &CompilerConfig) -> Result<Assembly, CompileFailure> {
    let (type_checker, diagnostics) = type_check(program, config)?;

    if !diagnostics.is_empty() {
        return Err(CompileFailure::Diagnostics(diagnostics));
    }

    Ok(compile(&type_checker, config)?)
}
