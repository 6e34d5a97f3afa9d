use std::fmt::Display;

use thiserror::Error;

use crate::{config::ExitCodes, Position, SourceLines};

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_severity(&self) -> ErrorSeverity {
        self.internal_error.severity()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::IntegerOutOfRange { .. } => "IntegerOutOfRange",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::AssignTypeMismatch { .. } => "AssignTypeMismatch",
            ErrorImpl::ConditionNotBool { .. } => "ConditionNotBool",
            ErrorImpl::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorImpl::ReturnTypeMismatch { .. } => "ReturnTypeMismatch",
            ErrorImpl::StatementAfterReturn => "StatementAfterReturn",
            ErrorImpl::InvalidReadTarget { .. } => "InvalidReadTarget",
            ErrorImpl::InvalidFreeTarget { .. } => "InvalidFreeTarget",
            ErrorImpl::InvalidExitCode { .. } => "InvalidExitCode",
            ErrorImpl::TooManyArguments { .. } => "TooManyArguments",
            ErrorImpl::TooFewArguments { .. } => "TooFewArguments",
            ErrorImpl::ArgumentTypeMismatch { .. } => "ArgumentTypeMismatch",
            ErrorImpl::UndeclaredFunction { .. } => "UndeclaredFunction",
            ErrorImpl::DuplicateFunction { .. } => "DuplicateFunction",
            ErrorImpl::LeftOperandMismatch { .. } => "LeftOperandMismatch",
            ErrorImpl::RightOperandMismatch { .. } => "RightOperandMismatch",
            ErrorImpl::OperandTypeMismatch { .. } => "OperandTypeMismatch",
            ErrorImpl::UnaryOperandMismatch { .. } => "UnaryOperandMismatch",
            ErrorImpl::UndeclaredIdentifier { .. } => "UndeclaredIdentifier",
            ErrorImpl::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            ErrorImpl::NonIntegerIndex => "NonIntegerIndex",
            ErrorImpl::IndexNonArray { .. } => "IndexNonArray",
            ErrorImpl::TooManyIndices { .. } => "TooManyIndices",
            ErrorImpl::UnmatchedArrayLiteral => "UnmatchedArrayLiteral",
            ErrorImpl::PairElementOfNonPair { .. } => "PairElementOfNonPair",
            ErrorImpl::DivideByZero => "DivideByZero",
            ErrorImpl::ConstantOverflow { .. } => "ConstantOverflow",
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

/// Classification of a diagnostic. Ordered by precedence, highest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Runtime,
    Semantic,
    Syntactic,
}

impl ErrorSeverity {
    pub fn exit_code(&self, codes: &ExitCodes) -> i32 {
        match self {
            ErrorSeverity::Runtime => codes.runtime,
            ErrorSeverity::Semantic => codes.semantic,
            ErrorSeverity::Syntactic => codes.syntactic,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorImpl {
    #[error("Integer literal '{value}' is out of range")]
    IntegerOutOfRange { value: i64 },
    #[error("Function '{function}' is missing a return statement")]
    MissingReturn { function: String },

    #[error("Unable to assign '{received}' to '{expected}'")]
    AssignTypeMismatch { expected: String, received: String },
    #[error("Expected 'bool' in '{construct}' conditional, got '{received}'")]
    ConditionNotBool { construct: String, received: String },
    #[error("Returning outside of a function")]
    ReturnOutsideFunction,
    #[error("Function expected return type '{expected}' but got '{received}'")]
    ReturnTypeMismatch { expected: String, received: String },
    #[error("Additional statement after return")]
    StatementAfterReturn,
    #[error("Can only read from stdin to 'int' or 'char', not '{received}'")]
    InvalidReadTarget { received: String },
    #[error("Can only free a 'pair' or an 'array', not '{received}'")]
    InvalidFreeTarget { received: String },
    #[error("Expected exit type 'int', not '{received}'")]
    InvalidExitCode { received: String },
    #[error("Function '{function}' has too many arguments, expected '{expected}' got '{received}'")]
    TooManyArguments {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("Function '{function}' has too few arguments, expected '{expected}' got '{received}'")]
    TooFewArguments {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("Function '{function}' argument number '{position}' expected type '{expected}' got '{received}'")]
    ArgumentTypeMismatch {
        function: String,
        position: usize,
        expected: String,
        received: String,
    },
    /// The function-name counterpart of `UndeclaredIdentifier`
    #[error("Function '{function}' was not declared")]
    UndeclaredFunction { function: String },
    /// The overload counterpart of `DuplicateDeclaration`: same name and
    /// same parameter types
    #[error("Function '{function}' is declared more than once")]
    DuplicateFunction { function: String },
    #[error("Expected left argument of '{operator}' to be '{expected}' but got '{received}'")]
    LeftOperandMismatch {
        operator: String,
        expected: String,
        received: String,
    },
    #[error("Expected right argument of '{operator}' to be '{expected}' but got '{received}'")]
    RightOperandMismatch {
        operator: String,
        expected: String,
        received: String,
    },
    #[error("Type mismatch in '{operator}'")]
    OperandTypeMismatch { operator: String },
    #[error("Invalid argument of '{operator}', expected '{expected}' got '{received}'")]
    UnaryOperandMismatch {
        operator: String,
        expected: String,
        received: String,
    },
    #[error("Identifier '{identifier}' was not declared in the current scope")]
    UndeclaredIdentifier { identifier: String },
    #[error("Identifier '{identifier}' was previously declared in the current scope")]
    DuplicateDeclaration { identifier: String },
    #[error("Tried to index an array using a non-integer")]
    NonIntegerIndex,
    #[error("Tried to index a non-array type '{received}'")]
    IndexNonArray { received: String },
    #[error("Tried to access array '{array}' with '{dimensions}' dimensions to a degree of '{depth}'")]
    TooManyIndices {
        array: String,
        dimensions: i32,
        depth: usize,
    },
    #[error("Unmatched index types in array literal")]
    UnmatchedArrayLiteral,
    #[error("Tried to access an element of non-pair type '{received}'")]
    PairElementOfNonPair { received: String },

    #[error("Tried to divide by zero")]
    DivideByZero,
    #[error("Integer overflow in constant expression using '{operator}'")]
    ConstantOverflow { operator: String },
}

impl ErrorImpl {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorImpl::IntegerOutOfRange { .. } | ErrorImpl::MissingReturn { .. } => {
                ErrorSeverity::Syntactic
            }
            ErrorImpl::DivideByZero | ErrorImpl::ConstantOverflow { .. } => ErrorSeverity::Runtime,
            _ => ErrorSeverity::Semantic,
        }
    }
}

/// Every diagnostic of one compilation run, in emission order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { errors: vec![] }
    }

    pub fn push(&mut self, error: Error) {
        log::trace!("diagnostic on line {}: {}", error.get_position().0, error);
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    /// The highest-precedence severity of the run, `None` when it succeeded.
    pub fn severity(&self) -> Option<ErrorSeverity> {
        self.errors.iter().map(Error::get_severity).max()
    }

    pub fn exit_code(&self, codes: &ExitCodes) -> i32 {
        match self.severity() {
            Some(severity) => severity.exit_code(codes),
            None => codes.success,
        }
    }

    /// Renders the report shown to the user once analysis has finished.
    ///
    /// # Arguments
    ///
    /// * `source` - Line lookup used to quote the offending source text
    ///
    /// # Returns
    ///
    /// One block per diagnostic followed by the error count.
    pub fn render(&self, source: &dyn SourceLines) -> String {
        let mut report = String::new();

        for error in self.errors.iter() {
            let line = error.get_position().0;
            let line_text = source.line_text(line).unwrap_or("").trim();
            report.push_str(&format!("Error on line {}:\n>>  {}\n{}\n", line, line_text, error));
        }

        if !self.errors.is_empty() {
            report.push_str(&format!("{} error(s) detected\n", self.errors.len()));
        }

        report
    }
}

/// Violations of the compiler's own invariants. These are defects in the
/// compiler, never problems with the program being compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("function {function:?} disappeared from the function table")]
    UnresolvedFunction { function: String },
    #[error("function {function:?} reached code generation without a body")]
    MissingFunctionBody { function: String },
    #[error("scope #{scope} does not exist")]
    UnknownScope { scope: usize },
    #[error("variable {variable:?} is not reachable from scope #{scope}")]
    UnreachableVariable { variable: String, scope: usize },
    #[error("type stack underflow while checking line {line}")]
    TypeStackUnderflow { line: u32 },
}

/// Why a call to [`crate::compile_program`] produced no assembly.
#[derive(Error, Debug, Clone)]
pub enum CompileFailure {
    #[error("compilation failed with {} error(s)", .0.count())]
    Diagnostics(Diagnostics),
    #[error("internal compiler error: {0}")]
    Internal(#[from] InternalError),
}
