//! Authentication for the theatre log dashboard
//!
//! The [`SessionGuard`] checks credentials either against a single static
//! credential (offline mode) or against a remote user table (connected
//! mode) and keeps one time-bounded session.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod session;
pub mod validation;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use session::{AuthMode, SessionGuard};
