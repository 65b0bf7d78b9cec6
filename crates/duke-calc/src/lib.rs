//! # duke-calc
//!
//! An incremental spreadsheet formula engine.
//!
//! Formulas are lexed, parsed into an AST and evaluated against a cell
//! store. The engine records which cells each formula reads and, when a
//! cell changes, recalculates every formula downstream of it in dependency
//! order.
//!
//! ## Features
//!
//! - Arithmetic with `+ - * / % ^`, unary minus and parentheses
//! - Cell references (`A1`) and range arguments (`SUM(A1:A10)`)
//! - Built-in functions: SUM, AVERAGE, MIN, MAX, COUNT, IF, ABS, SQRT, ROUND, POWER
//! - Custom functions through the [`FunctionRegistry`]
//! - Circular reference detection
//! - Failures become the `#ERROR` cell value instead of escaping the engine
//!
//! ## Example
//!
//! ```rust
//! use duke_calc::prelude::*;
//!
//! let mut engine = FormulaEngine::new();
//! let a1 = CellAddress::parse("A1").unwrap();
//!
//! assert_eq!(engine.calculate("=1+2*3", a1), CellValue::Number(7.0));
//! assert_eq!(engine.calculate("=1/0", a1), CellValue::Error);
//! assert_eq!(CellValue::Error.to_string(), "#ERROR");
//! ```

pub mod calculation;
pub mod prelude;

// Re-export calculation types
pub use calculation::{CalculationStats, EngineOptions, FormulaEngine};

// Re-export core types
pub use duke_calc_core::{
    CellAddress, CellKey, CellRange, CellRecord, CellStore, CellValue, Error, Result, ValueStore,
    ERROR_SENTINEL,
};

// Re-export formula types
pub use duke_calc_formula::{
    evaluate, lexer, parse_formula, parse_formula_with_options, tokenize, AstNode,
    DependencyGraph, EvalError, EvaluationContext, FormulaError, FormulaResult, FormulaValue,
    FunctionDef, FunctionRegistry, ParseError, ParseOptions, RegistryError, Token, TokenKind,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_RANGE_CELLS,
};
