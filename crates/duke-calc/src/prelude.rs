//! Prelude module - common imports for duke-calc users
//!
//! ```rust
//! use duke_calc::prelude::*;
//! ```

pub use crate::{
    // Engine types
    CalculationStats,
    // Cell types
    CellAddress,
    CellKey,
    CellRange,
    CellRecord,
    CellStore,
    CellValue,
    EngineOptions,
    // Error types
    Error,
    FormulaEngine,
    FormulaError,
    // Functions
    FunctionDef,
    FunctionRegistry,
    Result,
    ValueStore,
};
