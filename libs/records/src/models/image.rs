//! Gallery image model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored gallery image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    pub name: String,
    /// `data:<mime>;base64,...` URL
    pub content: String,
    /// Size of the decoded image in bytes
    pub size: u64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Image accepted by ingestion, ready to be stored
#[derive(Debug, Clone)]
pub struct NewImage {
    pub name: String,
    pub content: String,
    pub size: u64,
    pub content_type: String,
}
