//! Error types for record decoding.

use thiserror::Error;

/// Result type alias for record operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while turning a request body into a [`crate::Record`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}
