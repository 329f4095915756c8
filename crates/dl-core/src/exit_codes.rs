//! Exit codes for the data-logger CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.

/// Exit codes for data-logger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed
    Clean = 0,

    /// Configuration error
    ConfigError = 10,

    /// Could not bind or serve the ingestion endpoint
    ServeError = 11,

    /// Data file could not be opened or written
    StoreError = 12,

    /// Link code could not be produced or decoded
    DescriptorError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::ConfigError.as_i32(), 10);
        assert_eq!(ExitCode::ServeError.as_i32(), 11);
        assert_eq!(ExitCode::StoreError.as_i32(), 12);
        assert_eq!(ExitCode::DescriptorError.as_i32(), 13);
        assert_eq!(ExitCode::InternalError.as_i32(), 99);
    }
}
