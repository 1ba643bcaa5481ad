//! Error types for package database queries and analysis

use thiserror::Error;

/// Result type alias for package operations
pub type Result<T> = std::result::Result<T, Error>;

/// Package database and analysis errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Package data not available: {0}")]
    NotAvailable(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Invalid package entry {path}: {message}")]
    InvalidEntry { path: String, message: String },

    #[error("Unknown issue code: {0}")]
    UnknownIssue(String),

    #[error("Invalid issue pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("Configuration error: {0}")]
    Config(#[from] confcheck_config::ConfigError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDirError(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
