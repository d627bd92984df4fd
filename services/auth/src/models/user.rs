//! User model and related functionality

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role given to the offline credential
pub const ADMIN_ROLE: &str = "admin";

/// Row returned by the remote user table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

/// User login credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The single credential pair accepted in offline mode
#[derive(Clone, PartialEq)]
pub struct StaticCredential {
    pub username: String,
    pub password: String,
}

impl Default for StaticCredential {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl StaticCredential {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}
