//! Sprout data logger.
//!
//! Receives data samples over HTTP, appends them to a self-describing data
//! file and advertises the endpoint through a link code.

pub mod error;
pub mod exit_codes;
pub mod ingest;
pub mod link;
pub mod logging;
pub mod server;

pub use error::{CoreError, Result};
pub use exit_codes::ExitCode;
pub use ingest::{IngestService, Reply};
pub use server::IngestServer;
