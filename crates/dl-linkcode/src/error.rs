//! Error types for descriptor encoding and address discovery.

use thiserror::Error;

/// Errors from descriptor encoding and decoding.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("{field} does not fit the one-byte length field: {len} > 255")]
    CapacityExceeded { field: &'static str, len: usize },

    #[error("descriptor too short: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },

    #[error("descriptor length mismatch: header declares {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("unsupported descriptor version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid flags byte: {0:#04x}")]
    InvalidFlags(u8),

    #[error("path is not valid UTF-8")]
    InvalidPath,

    #[error("link code is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors from enumerating local network interfaces.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("could not enumerate interfaces: {0}")]
    Enumerate(#[source] std::io::Error),

    #[error("interface enumeration is not supported on this platform")]
    Unsupported,
}
