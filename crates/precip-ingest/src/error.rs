//! Error types for table store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while listing, reading or writing tables.
///
/// All of these are scoped to one table: the driver skips the affected
/// scenario and carries on with the next one.
#[derive(Debug, Error)]
pub enum StoreError {
    // === Discovery ===
    /// Store root does not exist.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Discovery pattern is not a valid glob.
    #[error("invalid discovery pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    // === Reading ===
    /// No table with this name exists in the store.
    #[error("table not found: {name}")]
    NotFound { name: String },

    /// Failed to read the table's backing file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not well-formed CSV.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A cell could not be read as its column's type.
    #[error("{name}: row {row}, column '{column}': cannot read '{value}' as {expected}")]
    Cell {
        name: String,
        column: String,
        row: usize,
        value: String,
        expected: &'static str,
    },

    // === Writing ===
    /// Failed to write or publish the table's backing file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove the table's backing file.
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === DataFrame ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {0}")]
    Frame(#[from] polars::prelude::PolarsError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
