//! Error types for the record store

use common::error::StorageError;
use thiserror::Error;

/// Error returned by record store operations
#[derive(Error, Debug)]
pub enum RecordError {
    /// Missing or malformed input field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Image rejected at ingestion (type or size)
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// Snapshot could not be persisted or loaded
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RecordError {
    pub(crate) fn missing(field: &str) -> Self {
        RecordError::Validation(format!("{field} is required"))
    }
}

/// Type alias for record store results
pub type RecordResult<T> = Result<T, RecordError>;
