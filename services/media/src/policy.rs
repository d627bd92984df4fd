//! Image acceptance policy

use records::RecordError;

/// Default maximum image size: 5 MiB
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;

/// Default allow-list of image MIME types
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Canonical form of a MIME type: trimmed and lowercased
pub fn normalize_content_type(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Which images the gallery accepts
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePolicy {
    pub allowed_types: Vec<String>,
    pub max_size: u64,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
            max_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }
}

impl ImagePolicy {
    /// Create a new ImagePolicy from environment variables
    ///
    /// # Environment Variables
    /// - `MAX_IMAGE_SIZE`: maximum size in bytes (default: 5242880)
    /// - `ALLOWED_IMAGE_TYPES`: comma-separated MIME types
    ///   (default: "image/jpeg,image/png,image/webp")
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_size = std::env::var("MAX_IMAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_size);

        let allowed_types = std::env::var("ALLOWED_IMAGE_TYPES")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(normalize_content_type)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|types| !types.is_empty())
            .unwrap_or(defaults.allowed_types);

        Self {
            allowed_types,
            max_size,
        }
    }

    pub fn is_type_allowed(&self, content_type: &str) -> bool {
        let content_type = normalize_content_type(content_type);
        self.allowed_types.iter().any(|t| *t == content_type)
    }

    /// Check type first, then size
    pub fn check(&self, content_type: &str, size: u64) -> Result<(), RecordError> {
        if !self.is_type_allowed(content_type) {
            return Err(RecordError::UnsupportedMedia(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                content_type,
                self.allowed_types.join(", ")
            )));
        }

        if size > self.max_size {
            return Err(RecordError::UnsupportedMedia(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.max_size,
                self.max_size / 1024 / 1024
            )));
        }

        Ok(())
    }
}
