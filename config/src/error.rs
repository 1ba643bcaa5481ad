//! Error types for configuration operations

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid package atom: {0}")]
    InvalidAtom(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Unknown override category: {0}")]
    UnknownCategory(String),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
