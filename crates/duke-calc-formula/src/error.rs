//! Formula error types

use crate::lexer::TokenKind;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Result type for evaluation steps
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Errors raised while parsing a token stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The parser found a token it cannot accept here
    #[error("Expected {expected}, got {found} '{text}' at position {position}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        text: String,
        position: usize,
    },

    /// Nesting exceeded the configured maximum depth
    #[error("Formula nesting exceeds maximum depth of {max_depth} at position {position}")]
    TooDeep { max_depth: usize, position: usize },
}

/// Errors raised while evaluating an AST
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Cell reference text that does not name a cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A range reference where a single value is required
    #[error("Range {0} cannot be used as a single value")]
    RangeNotAllowed(String),

    /// A range covering more cells than the configured limit
    #[error("Range {range} covers {cells} cells, limit is {limit}")]
    RangeTooLarge {
        range: String,
        cells: u64,
        limit: usize,
    },

    #[error("AVERAGE of no values")]
    EmptyAverage,

    /// Argument outside the function's domain
    #[error("Invalid argument for {function}: {reason}")]
    InvalidArgument {
        function: &'static str,
        reason: String,
    },
}

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Errors raised when registering a function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Function name must not be empty")]
    EmptyName,

    #[error("Function {0} is already registered")]
    Duplicate(String),

    #[error("Function {name} has min_args {min} greater than max_args {max}")]
    InvalidArity { name: String, min: usize, max: usize },
}
