//! Config resolution.
//!
//! Precedence, highest first: command line, environment, config file,
//! built-in defaults. The config file is the one named on the command line
//! or in `DATA_LOGGER_CONFIG`, else `data_logger/config.json` under the
//! user config directory when it exists.

use std::path::{Path, PathBuf};

use crate::validate::{parse_separator, validate, ConfigError};
use crate::LoggerConfig;

pub const ENV_CONFIG: &str = "DATA_LOGGER_CONFIG";
pub const ENV_PORT: &str = "DATA_LOGGER_PORT";
pub const ENV_FILE: &str = "DATA_LOGGER_FILE";
pub const ENV_SEPARATOR: &str = "DATA_LOGGER_SEPARATOR";
pub const ENV_PATH: &str = "DATA_LOGGER_PATH";

const CONFIG_DIR_NAME: &str = "data_logger";
const CONFIG_FILE_NAME: &str = "config.json";

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub data_file: Option<PathBuf>,
    pub separator: Option<String>,
    pub ingest_path: Option<String>,
}

/// Resolve configuration from the process environment.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<LoggerConfig, ConfigError> {
    resolve_config_with(overrides, |name| std::env::var(name).ok())
}

/// Resolve configuration with an explicit environment lookup.
pub fn resolve_config_with<F>(overrides: &ConfigOverrides, env: F) -> Result<LoggerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = overrides
        .config_file
        .clone()
        .or_else(|| env(ENV_CONFIG).map(PathBuf::from));

    let mut config = match explicit {
        Some(path) => load_config_file(&path)?,
        None => match user_config_file(&env) {
            Some(path) if path.is_file() => load_config_file(&path)?,
            _ => LoggerConfig::default(),
        },
    };

    if let Some(raw) = env(ENV_PORT) {
        config.port = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::InvalidEnv {
                name: ENV_PORT,
                value: raw.clone(),
                reason: e.to_string(),
            }
        })?;
    }
    if let Some(raw) = env(ENV_FILE) {
        config.data_file = PathBuf::from(raw);
    }
    if let Some(raw) = env(ENV_SEPARATOR) {
        config.separator = parse_separator(&raw)?;
    }
    if let Some(raw) = env(ENV_PATH) {
        config.ingest_path = raw;
    }

    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(file) = &overrides.data_file {
        config.data_file = file.clone();
    }
    if let Some(raw) = &overrides.separator {
        config.separator = parse_separator(raw)?;
    }
    if let Some(path) = &overrides.ingest_path {
        config.ingest_path = path.clone();
    }

    validate(&config)?;
    Ok(config)
}

/// Load a JSON config file; missing keys take their defaults.
pub fn load_config_file(path: &Path) -> Result<LoggerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn user_config_file<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match env("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => dirs::config_dir()?,
    };
    Some(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Environment with an empty XDG dir so the user's real config never
    /// leaks into a test.
    fn env_with(tmp: &TempDir, vars: &[(&str, &str)]) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env.insert(
            "XDG_CONFIG_HOME".into(),
            tmp.path().to_string_lossy().into_owned(),
        );
        env
    }

    fn resolve(overrides: &ConfigOverrides, env: &HashMap<String, String>) -> Result<LoggerConfig, ConfigError> {
        resolve_config_with(overrides, |name| env.get(name).cloned())
    }

    #[test]
    fn defaults_without_any_source() {
        let tmp = TempDir::new().unwrap();
        let config = resolve(&ConfigOverrides::default(), &env_with(&tmp, &[])).unwrap();
        assert_eq!(config.port, 8090);
        assert_eq!(config.ingest_path, "/data");
    }

    #[test]
    fn user_config_file_is_picked_up() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data_logger");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), r#"{"port": 9100, "separator": ";"}"#).unwrap();

        let config = resolve(&ConfigOverrides::default(), &env_with(&tmp, &[])).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.separator, ';');
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("logger.json");
        std::fs::write(&file, r#"{"port": 9100, "ingest_path": "/file", "data_file": "file.csv"}"#).unwrap();

        let env = env_with(
            &tmp,
            &[
                (ENV_CONFIG, file.to_str().unwrap()),
                (ENV_PORT, "9200"),
                (ENV_PATH, "/env"),
            ],
        );
        let overrides = ConfigOverrides {
            port: Some(9300),
            ..ConfigOverrides::default()
        };

        let config = resolve(&overrides, &env).unwrap();
        assert_eq!(config.port, 9300);
        assert_eq!(config.ingest_path, "/env");
        assert_eq!(config.data_file, PathBuf::from("file.csv"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            config_file: Some(tmp.path().join("absent.json")),
            ..ConfigOverrides::default()
        };
        assert!(matches!(
            resolve(&overrides, &env_with(&tmp, &[])),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn malformed_env_values_are_reported() {
        let tmp = TempDir::new().unwrap();
        let err = resolve(
            &ConfigOverrides::default(),
            &env_with(&tmp, &[(ENV_PORT, "eighty")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: ENV_PORT, .. }));

        let err = resolve(
            &ConfigOverrides::default(),
            &env_with(&tmp, &[(ENV_SEPARATOR, "ab")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSeparator(..)));
    }

    #[test]
    fn resolved_config_is_validated() {
        let tmp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            ingest_path: Some("no-slash".into()),
            ..ConfigOverrides::default()
        };
        assert!(matches!(
            resolve(&overrides, &env_with(&tmp, &[])),
            Err(ConfigError::InvalidIngestPath(..))
        ));
    }
}
