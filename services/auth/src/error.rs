//! Error types for the session guard

use common::error::StorageError;
use thiserror::Error;

/// Error returned by login and session checks
#[derive(Error, Debug)]
pub enum AuthError {
    /// Blank username or password
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Wrong credentials, unknown user, or the user directory failed
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// Session could not be stored or cleared
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Type alias for auth results
pub type AuthResult<T> = Result<T, AuthError>;
