//! Image ingestion: validate an upload and store it as a data URL

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use records::{
    RecordResult, RecordStore,
    models::{ImageRecord, NewImage},
};
use tracing::{info, warn};

use crate::{
    policy::{ImagePolicy, normalize_content_type},
    upload::ImageUpload,
};

/// Turns uploads into stored gallery images
#[derive(Debug, Clone, Default)]
pub struct ImageIngestor {
    policy: ImagePolicy,
}

impl ImageIngestor {
    pub fn new(policy: ImagePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ImagePolicy {
        &self.policy
    }

    /// Validate `upload` and append it to the store's image collection.
    ///
    /// A rejected upload never touches the store.
    pub async fn ingest(
        &self,
        store: &mut RecordStore,
        upload: ImageUpload,
    ) -> RecordResult<ImageRecord> {
        let size = upload.effective_size();
        let content_type = normalize_content_type(&upload.content_type);
        if let Err(e) = self.policy.check(&content_type, size) {
            warn!("Rejected image {}: {}", upload.name, e);
            return Err(e);
        }

        let content = data_url(&content_type, &upload.bytes);
        let image = store
            .add_image(NewImage {
                name: upload.name,
                content,
                size,
                content_type,
            })
            .await?;

        info!("Ingested image {} as {}", image.name, image.id);
        Ok(image)
    }
}

/// Encode `bytes` as a `data:<mime>;base64,...` URL
pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, BASE64.encode(bytes))
}
