//! Cell storage
//!
//! The engine reads and writes cells only through [`CellStore`], keyed by
//! [`CellKey`]. Grids with their own storage implement the trait; everyone
//! else uses [`ValueStore`], a sparse map holding only non-empty cells.

use std::collections::BTreeMap;

use super::{CellAddress, CellKey, CellRecord, CellValue};
use crate::error::Result;

/// Keyed access to cell records
pub trait CellStore {
    /// Get the record stored under `key`
    fn get(&self, key: CellKey) -> Option<&CellRecord>;

    /// Get a mutable record stored under `key`
    fn get_mut(&mut self, key: CellKey) -> Option<&mut CellRecord>;

    /// Insert or replace the record under `key`
    fn set(&mut self, key: CellKey, record: CellRecord);

    /// Remove the record under `key`
    fn remove(&mut self, key: CellKey) -> Option<CellRecord>;

    /// Get the value stored under `key`
    fn value(&self, key: CellKey) -> Option<&CellValue> {
        self.get(key).map(|record| &record.value)
    }

    /// Overwrite the value under `key`, keeping any formula text
    fn set_value(&mut self, key: CellKey, value: CellValue) {
        match self.get_mut(key) {
            Some(record) => record.value = value,
            None => self.set(key, CellRecord::new(value)),
        }
    }
}

/// Default sparse store, ordered by row then column
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueStore {
    cells: BTreeMap<CellKey, CellRecord>,
}

impl ValueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain value by A1 address, e.g. `store.insert("A1", 1.0)`
    pub fn insert(&mut self, address: &str, value: impl Into<CellValue>) -> Result<()> {
        let key = CellAddress::parse(address)?.key();
        self.set(key, CellRecord::new(value));
        Ok(())
    }

    /// Look up a value by A1 address
    pub fn get_at(&self, address: &str) -> Result<Option<&CellValue>> {
        let key = CellAddress::parse(address)?.key();
        Ok(self.value(key))
    }

    /// Number of stored cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cells are stored
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over stored cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellKey, &CellRecord)> + '_ {
        self.cells.iter().map(|(k, v)| (*k, v))
    }
}

impl CellStore for ValueStore {
    fn get(&self, key: CellKey) -> Option<&CellRecord> {
        self.cells.get(&key)
    }

    fn get_mut(&mut self, key: CellKey) -> Option<&mut CellRecord> {
        self.cells.get_mut(&key)
    }

    fn set(&mut self, key: CellKey, record: CellRecord) {
        self.cells.insert(key, record);
    }

    fn remove(&mut self, key: CellKey) -> Option<CellRecord> {
        self.cells.remove(&key)
    }
}

impl FromIterator<(CellKey, CellRecord)> for ValueStore {
    fn from_iter<I: IntoIterator<Item = (CellKey, CellRecord)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}
