//! # duke-calc-formula
//!
//! Formula language for duke-calc.
//!
//! This crate provides:
//! - Lexing (text → tokens) and parsing (tokens → AST)
//! - Evaluation against a cell store (AST → value)
//! - A registry of built-in functions
//! - Dependency tracking for recalculation
//!
//! ## Example
//!
//! ```rust
//! use duke_calc_core::ValueStore;
//! use duke_calc_formula::{evaluate, parse_formula, EvaluationContext, FormulaValue};
//!
//! let mut store = ValueStore::new();
//! store.insert("A1", 2.0).unwrap();
//! store.insert("A2", 3.0).unwrap();
//!
//! let ast = parse_formula("=SUM(A1:A2) * 2").unwrap();
//! let result = evaluate(&ast, &EvaluationContext::new(&store)).unwrap();
//! assert_eq!(result, FormulaValue::Number(10.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use ast::{AstNode, BinaryOperator, UnaryOperator};
pub use dependency::DependencyGraph;
pub use error::{EvalError, EvalResult, FormulaError, FormulaResult, ParseError, RegistryError};
pub use evaluator::{evaluate, EvaluationContext, FormulaValue, DEFAULT_MAX_RANGE_CELLS};
pub use functions::{FunctionDef, FunctionImpl, FunctionRegistry};
pub use lexer::{cell_references, tokenize, Token, TokenKind};
pub use parser::{
    parse, parse_formula, parse_formula_with_options, parse_with_options, ParseOptions,
    DEFAULT_MAX_DEPTH,
};
