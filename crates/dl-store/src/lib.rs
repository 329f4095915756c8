//! Sprout data logger tabular store.
//!
//! This crate provides:
//! - Cell encoding of typed field values (`encode`)
//! - Append-only column schema bookkeeping (`schema`)
//! - The backing data file with atomic header migration (`store`)

pub mod encode;
pub mod error;
mod migration;
pub mod schema;
pub mod store;

pub use encode::{split_cells, EncodeMode, ValueEncoder, FLOAT_PRECISION};
pub use error::{Result, StoreError};
pub use schema::SchemaRegistry;
pub use store::{StoreOptions, TabularStore};
