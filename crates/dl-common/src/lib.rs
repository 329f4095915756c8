//! Sprout data logger common types.
//!
//! This crate provides the record model shared by the store and the
//! ingestion service:
//! - Typed scalar field values
//! - Insertion-ordered records
//! - Decoding of JSON request bodies into records

pub mod error;
pub mod value;

pub use error::{Error, Result};
pub use value::{FieldValue, Record};

/// Name of the column holding the ingestion time of each row.
pub const TIMESTAMP_FIELD: &str = "Timestamp";
