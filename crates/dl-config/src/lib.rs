//! Sprout data logger configuration.
//!
//! This crate provides:
//! - The typed configuration (`LoggerConfig`)
//! - Config resolution (CLI → env → config file → defaults)
//! - Semantic validation

pub mod resolve;
pub mod validate;

use std::path::PathBuf;

use chrono::Local;
use dl_linkcode::LinkFlags;
use serde::{Deserialize, Serialize};

pub use resolve::{resolve_config, resolve_config_with, ConfigOverrides};
pub use validate::{parse_separator, validate, ConfigError};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8090;

/// Default HTTP path of the ingestion endpoint.
pub const DEFAULT_INGEST_PATH: &str = "/data";

/// Default field separator.
pub const DEFAULT_SEPARATOR: char = ',';

/// Fully resolved logger configuration, immutable once the process starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Port to listen on; also advertised in the link code.
    pub port: u16,

    /// Backing data file.
    pub data_file: PathBuf,

    /// Field separator of the data file.
    pub separator: char,

    /// HTTP path that accepts samples.
    pub ingest_path: String,

    /// Protocol flags advertised in the link code.
    pub link_flags: LinkFlags,

    /// Refuse to emit a link code whose address count or path length does
    /// not fit its one-byte header field.
    pub strict_link_code: bool,

    /// Refuse records holding values without a cell representation instead
    /// of writing empty cells.
    pub strict_values: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_file: default_data_file(),
            separator: DEFAULT_SEPARATOR,
            ingest_path: DEFAULT_INGEST_PATH.to_string(),
            link_flags: LinkFlags::default(),
            strict_link_code: false,
            strict_values: false,
        }
    }
}

/// `data-YYYYMMDDHHMM.csv` in the working directory, stamped with the
/// local start time.
pub fn default_data_file() -> PathBuf {
    PathBuf::from(format!("data-{}.csv", Local::now().format("%Y%m%d%H%M")))
}
