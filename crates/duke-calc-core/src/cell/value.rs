//! Cell value types

use std::fmt;

/// Text shown for a cell whose formula failed to calculate
pub const ERROR_SENTINEL: &str = "#ERROR";

/// Represents the scalar value stored in a cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Numeric value
    Number(f64),

    /// String value
    String(String),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// A formula failed to lex, parse or evaluate; displays as `#ERROR`
    Error,
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Check if the cell holds the error sentinel
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error)
    }

    /// Try to get the value as a number, without coercion
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a boolean, without coercion
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a string, without coercion
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Number(_) => "number",
            CellValue::String(_) => "string",
            CellValue::Boolean(_) => "boolean",
            CellValue::Error => "error",
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Number(0.0)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error => write!(f, "{}", ERROR_SENTINEL),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

/// What the grid stores per cell: the displayed value and, for formula
/// cells, the formula text it was calculated from
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRecord {
    pub value: CellValue,
    pub formula: Option<String>,
}

impl CellRecord {
    /// A plain value cell
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            formula: None,
        }
    }

    /// A formula cell with its last calculated value
    pub fn with_formula(value: impl Into<CellValue>, formula: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            formula: Some(formula.into()),
        }
    }

    /// Check if the cell holds a formula
    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }
}
