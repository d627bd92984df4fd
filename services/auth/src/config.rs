//! Session guard configuration

use chrono::Duration;

use crate::models::StaticCredential;

/// Session guard configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Credential accepted in offline mode
    pub demo_credential: StaticCredential,
    /// Maximum session age
    pub session_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            demo_credential: StaticCredential::default(),
            session_ttl: Duration::hours(24),
        }
    }
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `DEMO_USERNAME`: offline username (default: "admin")
    /// - `DEMO_PASSWORD`: offline password (default: "admin123")
    /// - `SESSION_TTL_HOURS`: session lifetime in hours (default: 24)
    pub fn from_env() -> Self {
        let defaults = StaticCredential::default();
        let username = std::env::var("DEMO_USERNAME").unwrap_or(defaults.username);
        let password = std::env::var("DEMO_PASSWORD").unwrap_or(defaults.password);

        let ttl_hours = std::env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|hours| *hours > 0)
            .unwrap_or(24);

        Self {
            demo_credential: StaticCredential { username, password },
            session_ttl: Duration::hours(ttl_hours),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_auth_config_defaults() {
        unsafe {
            std::env::remove_var("DEMO_USERNAME");
            std::env::remove_var("DEMO_PASSWORD");
            std::env::remove_var("SESSION_TTL_HOURS");
        }

        let config = AuthConfig::from_env();
        assert!(config.demo_credential.matches("admin", "admin123"));
        assert_eq!(config.session_ttl, Duration::hours(24));
    }

    #[test]
    #[serial]
    fn test_auth_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("DEMO_USERNAME", "theatre");
            std::env::set_var("DEMO_PASSWORD", "s3cret");
            std::env::set_var("SESSION_TTL_HOURS", "8");
        }

        let config = AuthConfig::from_env();
        assert!(config.demo_credential.matches("theatre", "s3cret"));
        assert_eq!(config.session_ttl, Duration::hours(8));

        unsafe {
            std::env::set_var("SESSION_TTL_HOURS", "-3");
        }
        assert_eq!(AuthConfig::from_env().session_ttl, Duration::hours(24));

        unsafe {
            std::env::remove_var("DEMO_USERNAME");
            std::env::remove_var("DEMO_PASSWORD");
            std::env::remove_var("SESSION_TTL_HOURS");
        }
    }
}
