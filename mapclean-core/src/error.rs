//! Error types for mapclean

use thiserror::Error;

/// Main error type for mapclean operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dimension mismatch at point {index}: expected {expected} values, found {found}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No points remain after filtering")]
    EmptyResult,
}

/// Result type alias for mapclean operations
pub type Result<T> = std::result::Result<T, Error>;
