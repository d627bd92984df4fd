//! Gallery image ingestion
//!
//! Uploaded images are checked against an [`ImagePolicy`] (MIME allow-list
//! and size ceiling) and stored inline as base64 data URLs.

pub mod ingest;
pub mod policy;
pub mod upload;

pub use ingest::ImageIngestor;
pub use policy::ImagePolicy;
pub use upload::ImageUpload;
