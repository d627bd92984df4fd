//! Custom error types for the common library
//!
//! This module defines the storage and database errors shared by every
//! crate that persists state.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Error raised by a blob store backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// The write would exceed the configured storage quota
    #[error("Storage quota exceeded writing '{key}': {required} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        required: usize,
        available: usize,
    },

    /// A stored snapshot could not be decoded
    #[error("Corrupt snapshot under key '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// A value could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure in the file backend
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Redis backend failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
