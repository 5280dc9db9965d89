//! Unified error types for Carve

use thiserror::Error;

/// Minimum number of characters (after trimming) a PRD must contain
pub const MIN_PRD_LENGTH: usize = 30;

/// The only way the parser can reject its input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("PRD text is too short: {length} characters after trimming, at least {minimum} required")]
    TooShort { length: usize, minimum: usize },
}

/// Unified error type for all Carve operations
#[derive(Error, Debug)]
pub enum CarveError {
    #[error("Parsing error: {0}")]
    Parsing(#[from] ParsingError),

    #[error("Configuration error: {0}")]
    Config(String),

    // A single validator check that could not complete
    #[error("Validation check failed: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using CarveError
pub type Result<T> = std::result::Result<T, CarveError>;
