//! Operation log records
//!
//! This crate holds the typed operation and image records, the store that
//! owns and persists them, and the pure query, aggregation and export
//! functions the dashboard views are built from.

pub mod error;
pub mod export;
pub mod models;
pub mod query;
pub mod stats;
pub mod store;

pub use error::{RecordError, RecordResult};
pub use store::RecordStore;
