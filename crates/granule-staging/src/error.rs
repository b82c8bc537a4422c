//! Error types for the granule staging crate.

use thiserror::Error;

/// Errors that can occur while processing a granule.
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("DMR++ generation failed: {0}")]
    Generation(String),

    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to upload to storage: {0}")]
    StorageUpload(String),
}

/// Result type for staging operations.
pub type Result<T> = std::result::Result<T, StagingError>;
