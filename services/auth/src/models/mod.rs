//! Authentication models

pub mod session;
pub mod user;

// Re-export for convenience
pub use session::{Session, SessionToken};
pub use user::{ADMIN_ROLE, LoginCredentials, RemoteUser, StaticCredential};
