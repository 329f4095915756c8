//! Error types for store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening or writing a data file.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not append record line to {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write staging file {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not move staging file back to {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("header line missing from {0}")]
    MissingHeader(PathBuf),

    #[error("data file path has no file name: {0}")]
    InvalidPath(PathBuf),

    #[error("field name {field:?} cannot be used as a column: {reason}")]
    InvalidFieldName { field: String, reason: &'static str },

    #[error("field '{field}' holds a {kind} value that has no cell representation")]
    UnencodableValue { field: String, kind: &'static str },
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
