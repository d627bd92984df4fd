//! Repositories for user lookups

pub mod user;

pub use user::{UserDirectory, UserRepository};
