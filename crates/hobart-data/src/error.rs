//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP error status
    #[error("HTTP error: {0}")]
    Http(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required column missing from the holdings table
    #[error("Missing column in holdings table: {0}")]
    MissingColumn(String),

    /// No rows for the requested investor
    #[error("No holdings found for manager {0}")]
    ManagerNotFound(i64),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),
}
