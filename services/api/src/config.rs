//! HTTP service configuration

/// HTTP service configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the listener binds to
    pub bind_addr: String,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `API_BIND_ADDR`: listen address (default: "0.0.0.0:3001")
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());

        Self { bind_addr }
    }
}
