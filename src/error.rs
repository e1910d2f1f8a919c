//! Error types for the asnd service.

use thiserror::Error;

/// Main error type for asnd operations.
#[derive(Error, Debug)]
pub enum AsndError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for asnd operations.
pub type Result<T> = std::result::Result<T, AsndError>;
