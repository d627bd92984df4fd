//! Image uploads read into memory

use std::path::Path;

use tracing::info;

/// An image file as received from the user
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub name: String,
    pub content_type: String,
    /// Size reported by the sender
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Read a whole file in one awaited call; the MIME type comes from the extension
    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let content_type = content_type_from_extension(path).to_string();

        info!("Read upload {} ({} bytes, {})", name, bytes.len(), content_type);
        Ok(Self::new(name, content_type, bytes))
    }

    /// Size used for the ceiling check: whichever of the reported and actual sizes is larger
    pub fn effective_size(&self) -> u64 {
        self.size.max(self.bytes.len() as u64)
    }
}

/// Guess an image MIME type from a file extension
pub fn content_type_from_extension(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
