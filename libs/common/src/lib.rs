//! Common library for the theatre log services
//!
//! This crate provides shared functionality used across the workspace:
//! the blob store that holds collection snapshots, the clock, database
//! connectivity for the remote user directory, and logging setup.

pub mod blob_store;
pub mod cache;
pub mod clock;
pub mod database;
pub mod error;
pub mod logging;

/// Example usage of the blob store module
///
/// ```rust,no_run
/// use common::blob_store::{BlobStoreConfig, open_blob_store, read_json};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = BlobStoreConfig::from_env()?;
///     let store = open_blob_store(&config).await?;
///     let operations: Option<Vec<serde_json::Value>> =
///         read_json(store.as_ref(), "operations").await?;
///     println!("{} stored operations", operations.map_or(0, |ops| ops.len()));
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
