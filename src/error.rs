//! Error types for zomato_eda.

use thiserror::Error;

pub use crate::charts::ChartError;
pub use crate::config::ConfigError;
pub use crate::data::LoaderError;

/// Main error type for analysis runs.
#[derive(Error, Debug)]
pub enum Error {
    /// An input file could not be read or parsed
    #[error("Data access error: {0}")]
    DataAccess(#[from] LoaderError),

    /// A column is missing or holds the wrong kind of values
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A chart could not be produced
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    /// Configuration file problem
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Polars failed during a transformation
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when a column does not match what an operation expects.
///
/// These surface at the first use of the offending column, not at load time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Column absent from the table
    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    /// Column present but of an unusable type
    #[error("column '{column}' has type {found}, expected {expected}")]
    WrongType {
        column: String,
        expected: &'static str,
        found: String,
    },

    /// Lookup key appears more than once
    #[error("duplicate key {key} in column '{column}'")]
    DuplicateKey { column: String, key: String },

    /// Strict join found listing codes absent from the lookup
    #[error("{dropped} listing rows have country codes missing from the lookup: {codes:?}")]
    UnmatchedCountryCodes { dropped: usize, codes: Vec<i64> },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
