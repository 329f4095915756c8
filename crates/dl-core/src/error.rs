//! Top-level error type for the data logger.

use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Result type alias for data logger operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Unified error type for the data logger.
#[derive(Error, Debug)]
pub enum CoreError {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(#[from] dl_config::ConfigError),

    // Serving errors (20-29)
    #[error("could not listen on {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("invalid sample: {0}")]
    Record(#[from] dl_common::Error),

    // Store errors (30-39)
    #[error("{0}")]
    Store(#[from] dl_store::StoreError),

    #[error("data store unavailable after an earlier writer panicked")]
    StoreUnavailable,

    // Link code errors (40-49)
    #[error("link code error: {0}")]
    Descriptor(#[from] dl_linkcode::DescriptorError),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns the error code for this error type.
    pub fn code(&self) -> u32 {
        match self {
            CoreError::Config(_) => 10,
            CoreError::Bind { .. } => 20,
            CoreError::Record(_) => 21,
            CoreError::Store(_) => 30,
            CoreError::StoreUnavailable => 31,
            CoreError::Descriptor(_) => 40,
            CoreError::Io(_) => 60,
            CoreError::Json(_) => 61,
        }
    }

    /// Process exit code for a command that failed with this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CoreError::Config(_) => ExitCode::ConfigError,
            CoreError::Bind { .. } | CoreError::Record(_) => ExitCode::ServeError,
            CoreError::Store(_) | CoreError::StoreUnavailable => ExitCode::StoreError,
            CoreError::Descriptor(_) => ExitCode::DescriptorError,
            CoreError::Io(_) | CoreError::Json(_) => ExitCode::InternalError,
        }
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Record(_)
                | CoreError::Store(
                    dl_store::StoreError::UnencodableValue { .. }
                        | dl_store::StoreError::InvalidFieldName { .. }
                )
        )
    }
}
