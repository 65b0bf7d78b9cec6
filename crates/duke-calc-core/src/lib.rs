//! # duke-calc-core
//!
//! Core data structures for the duke-calc formula engine.
//!
//! This crate provides the fundamental types used throughout duke-calc:
//! - [`CellValue`] and [`CellRecord`] - What a cell holds (value plus optional formula)
//! - [`CellAddress`], [`CellRange`] and [`CellKey`] - Cell addressing
//! - [`CellStore`] and [`ValueStore`] - The `"row,col"`-keyed value store
//!
//! ## Example
//!
//! ```rust
//! use duke_calc_core::{CellAddress, CellStore, CellValue, ValueStore};
//!
//! let mut store = ValueStore::new();
//! let a1 = CellAddress::parse("A1").unwrap();
//!
//! store.set_value(a1.key(), CellValue::Number(42.0));
//! assert_eq!(store.value(a1.key()), Some(&CellValue::Number(42.0)));
//! ```

pub mod cell;
pub mod error;

// Re-exports for convenience
pub use cell::{
    CellAddress, CellKey, CellRange, CellRangeIterator, CellRecord, CellStore, CellValue,
    ValueStore, ERROR_SENTINEL,
};
pub use error::{Error, Result};
