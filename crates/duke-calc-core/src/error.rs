//! Error types for duke-calc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in duke-calc-core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Invalid `"row,col"` store key
    #[error("Invalid cell key: {0}")]
    InvalidKey(String),

    /// Row number does not fit the row index type
    #[error("Row number {0} out of bounds")]
    RowOutOfBounds(String),

    /// Column letters do not fit the column index type
    #[error("Column {0} out of bounds")]
    ColumnOutOfBounds(String),
}
