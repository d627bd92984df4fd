//! Record store for operations and gallery images
//!
//! The store keeps both collections in memory and rewrites the whole
//! snapshot of a collection on every mutation. A mutation is applied to a
//! copy first and only replaces the in-memory collection once the snapshot
//! has been persisted, so a failed write leaves the store as it was.

use std::sync::Arc;

use common::{
    blob_store::{BlobStore, read_json, write_json},
    clock::Clock,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::RecordResult,
    models::{ImageRecord, NewImage, NewOperation, OperationPatch, OperationRecord},
};

/// Blob store key holding the operation snapshot
pub const OPERATIONS_KEY: &str = "operations";
/// Blob store key holding the image snapshot
pub const IMAGES_KEY: &str = "images";

/// Owner of the operation and image collections
pub struct RecordStore {
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    operations: Vec<OperationRecord>,
    images: Vec<ImageRecord>,
}

impl RecordStore {
    /// Load both collections from `blobs`; missing snapshots start empty
    pub async fn load(blobs: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> RecordResult<Self> {
        let operations: Vec<OperationRecord> = read_json(blobs.as_ref(), OPERATIONS_KEY)
            .await?
            .unwrap_or_default();
        let images: Vec<ImageRecord> = read_json(blobs.as_ref(), IMAGES_KEY)
            .await?
            .unwrap_or_default();

        info!(
            "Record store loaded: {} operations, {} images",
            operations.len(),
            images.len()
        );

        Ok(Self {
            blobs,
            clock,
            operations,
            images,
        })
    }

    /// Validate and append a new operation
    pub async fn add(&mut self, new_operation: NewOperation) -> RecordResult<OperationRecord> {
        let id = self.fresh_id();
        let record = new_operation.into_record(id, self.clock.now())?;

        let mut next = self.operations.clone();
        next.push(record.clone());
        self.commit_operations(next).await?;

        info!(
            "Operation {} added for {} ({})",
            record.id, record.date, record.operation_type
        );
        Ok(record)
    }

    /// Merge `patch` into the operation `id`; `Ok(None)` when it does not exist
    pub async fn update(
        &mut self,
        id: Uuid,
        patch: OperationPatch,
    ) -> RecordResult<Option<OperationRecord>> {
        let Some(index) = self.operations.iter().position(|op| op.id == id) else {
            return Ok(None);
        };

        let mut next = self.operations.clone();
        patch.apply_to(&mut next[index])?;
        let updated = next[index].clone();
        self.commit_operations(next).await?;

        info!("Operation {} updated", id);
        Ok(Some(updated))
    }

    /// Remove the operation `id`, returning whether it existed
    pub async fn delete(&mut self, id: Uuid) -> RecordResult<bool> {
        let Some(index) = self.operations.iter().position(|op| op.id == id) else {
            return Ok(false);
        };

        let mut next = self.operations.clone();
        next.remove(index);
        self.commit_operations(next).await?;

        info!("Operation {} deleted", id);
        Ok(true)
    }

    /// Copy of every stored operation, in insertion order
    pub fn all(&self) -> Vec<OperationRecord> {
        self.operations.clone()
    }

    /// Read-only view used by the query and aggregation functions
    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    pub fn get(&self, id: Uuid) -> Option<OperationRecord> {
        self.operations.iter().find(|op| op.id == id).cloned()
    }

    /// Store an image that already passed ingestion checks
    pub async fn add_image(&mut self, new_image: NewImage) -> RecordResult<ImageRecord> {
        let image = ImageRecord {
            id: self.fresh_id(),
            name: new_image.name,
            content: new_image.content,
            size: new_image.size,
            content_type: new_image.content_type,
            uploaded_at: self.clock.now(),
        };

        let mut next = self.images.clone();
        next.push(image.clone());
        self.commit_images(next).await?;

        info!("Image {} stored ({} bytes)", image.id, image.size);
        Ok(image)
    }

    /// Copy of every stored image
    pub fn images(&self) -> Vec<ImageRecord> {
        self.images.clone()
    }

    /// Remove the image `id`, returning whether it existed
    pub async fn delete_image(&mut self, id: Uuid) -> RecordResult<bool> {
        let Some(index) = self.images.iter().position(|img| img.id == id) else {
            return Ok(false);
        };

        let mut next = self.images.clone();
        next.remove(index);
        self.commit_images(next).await?;

        info!("Image {} deleted", id);
        Ok(true)
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            let taken = self.operations.iter().any(|op| op.id == id)
                || self.images.iter().any(|img| img.id == id);
            if !taken {
                return id;
            }
        }
    }

    async fn commit_operations(&mut self, next: Vec<OperationRecord>) -> RecordResult<()> {
        if let Err(e) = write_json(self.blobs.as_ref(), OPERATIONS_KEY, &next).await {
            error!("Failed to persist operations snapshot: {}", e);
            return Err(e.into());
        }
        self.operations = next;
        Ok(())
    }

    async fn commit_images(&mut self, next: Vec<ImageRecord>) -> RecordResult<()> {
        if let Err(e) = write_json(self.blobs.as_ref(), IMAGES_KEY, &next).await {
            error!("Failed to persist images snapshot: {}", e);
            return Err(e.into());
        }
        self.images = next;
        Ok(())
    }
}
