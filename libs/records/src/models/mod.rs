//! Record models

pub mod image;
pub mod operation;

// Re-export for convenience
pub use image::{ImageRecord, NewImage};
pub use operation::{AccountType, NewOperation, OperationPatch, OperationRecord, parse_case_count};
