//! Session model and related functionality

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque bearer token handed to a client on login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Blob store key holding the session for this token
    pub fn storage_key(&self) -> String {
        format!("session:{}", self.0.simple())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Authenticated state of one client's dashboard session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.logged_in_at + ttl
    }

    /// A session is expired once its age exceeds `ttl`
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.logged_in_at > ttl
    }
}
