//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The scalar value held by a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`CellKey`] - The opaque `"row,col"` key used by stores and the dependency graph
//! - [`CellStore`] - Storage seam between the engine and the grid

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellKey, CellRange, CellRangeIterator};
pub use storage::{CellStore, ValueStore};
pub use value::{CellRecord, CellValue, ERROR_SENTINEL};
