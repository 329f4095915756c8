//! Configuration validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::LoggerConfig;

/// Errors from loading, resolving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("port must be between 1 and 65535")]
    InvalidPort,

    #[error("invalid separator {0:?}: {1}")]
    InvalidSeparator(String, &'static str),

    #[error("invalid ingest path {0:?}: {1}")]
    InvalidIngestPath(String, &'static str),
}

/// Parse a separator given on the command line or in the environment.
///
/// Accepts exactly one character; `\t` and `tab` stand for TAB.
pub fn parse_separator(raw: &str) -> Result<char, ConfigError> {
    let sep = match raw {
        "\\t" | "tab" => '\t',
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                (None, _) => {
                    return Err(ConfigError::InvalidSeparator(raw.to_string(), "empty"))
                }
                _ => {
                    return Err(ConfigError::InvalidSeparator(
                        raw.to_string(),
                        "must be a single character",
                    ))
                }
            }
        }
    };
    check_separator(sep)?;
    Ok(sep)
}

fn check_separator(sep: char) -> Result<(), ConfigError> {
    match sep {
        '"' => Err(ConfigError::InvalidSeparator(
            sep.to_string(),
            "the quote character is reserved for quoting cells",
        )),
        '\n' | '\r' => Err(ConfigError::InvalidSeparator(
            sep.to_string(),
            "line terminators cannot separate fields",
        )),
        _ => Ok(()),
    }
}

/// Check a resolved configuration for semantic errors.
pub fn validate(config: &LoggerConfig) -> Result<(), ConfigError> {
    if config.port == 0 {
        return Err(ConfigError::InvalidPort);
    }

    check_separator(config.separator)?;

    let path = &config.ingest_path;
    if !path.starts_with('/') {
        return Err(ConfigError::InvalidIngestPath(
            path.clone(),
            "must start with '/'",
        ));
    }
    if !path.is_ascii() {
        return Err(ConfigError::InvalidIngestPath(path.clone(), "must be ASCII"));
    }
    if config.strict_link_code && path.len() > usize::from(u8::MAX) {
        return Err(ConfigError::InvalidIngestPath(
            path.clone(),
            "longer than 255 bytes",
        ));
    }

    Ok(())
}
