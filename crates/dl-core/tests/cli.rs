//! CLI E2E tests for the data-logger binary.
//!
//! Validates:
//! - `decode` prints a descriptor as JSON
//! - `link-code` prints a code that decodes back to the configured endpoint
//! - Config and link code errors map to their exit codes

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// Command for the data-logger binary with an isolated config directory.
fn data_logger(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("data-logger");
    cmd.timeout(Duration::from_secs(60))
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("DATA_LOGGER_CONFIG")
        .env_remove("DATA_LOGGER_PORT")
        .env_remove("DATA_LOGGER_FILE")
        .env_remove("DATA_LOGGER_SEPARATOR")
        .env_remove("DATA_LOGGER_PATH")
        .env_remove("RUST_LOG");
    cmd
}

fn link_code_from(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .find_map(|l| l.strip_prefix("Link code: "))
        .expect("link code line")
        .trim()
        .to_string()
}

#[test]
fn decode_prints_descriptor_json() {
    let home = tempdir().unwrap();
    let output = data_logger(&home)
        .args(["decode", "AQAFpJofL2RhdGE="])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"port\": 8090"))
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("parse JSON");
    assert_eq!(json["path"], "/data");
    assert_eq!(json["addresses"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["lan_mode"], true);
}

#[test]
fn decode_rejects_garbage() {
    let home = tempdir().unwrap();
    data_logger(&home)
        .args(["decode", "not base64!"])
        .assert()
        .failure()
        .code(13)
        .stderr(predicate::str::contains("link code"));
}

#[test]
fn decode_rejects_truncated_code() {
    let home = tempdir().unwrap();
    // Header only, but claims a five byte path.
    data_logger(&home)
        .args(["decode", "AQAFpJof"])
        .assert()
        .failure()
        .code(13);
}

#[test]
fn link_code_round_trips_through_decode() {
    let home = tempdir().unwrap();
    let output = data_logger(&home)
        .args(["--port", "9100", "--path", "/samples", "link-code"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let code = link_code_from(&output);

    let decoded = data_logger(&home)
        .args(["decode", &code])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&decoded).expect("parse JSON");
    assert_eq!(json["port"], 9100);
    assert_eq!(json["path"], "/samples");
}

#[test]
fn invalid_separator_is_config_error() {
    let home = tempdir().unwrap();
    data_logger(&home)
        .args(["--separator", "ab", "link-code"])
        .assert()
        .failure()
        .code(10);
}

#[test]
fn invalid_ingest_path_is_config_error() {
    let home = tempdir().unwrap();
    data_logger(&home)
        .args(["--path", "data", "link-code"])
        .assert()
        .failure()
        .code(10);
}

#[test]
fn config_file_values_are_used() {
    let home = tempdir().unwrap();
    let config = home.path().join("logger.json");
    fs::write(&config, r#"{"port": 7001, "ingest_path": "/in"}"#).unwrap();

    let output = data_logger(&home)
        .arg("--config")
        .arg(&config)
        .arg("link-code")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let code = link_code_from(&output);

    data_logger(&home)
        .args(["decode", &code])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"port\": 7001"))
        .stdout(predicate::str::contains("\"/in\""));
}

#[test]
fn malformed_config_file_is_config_error() {
    let home = tempdir().unwrap();
    let config = home.path().join("logger.json");
    fs::write(&config, "{ not json").unwrap();

    data_logger(&home)
        .arg("--config")
        .arg(&config)
        .arg("link-code")
        .assert()
        .failure()
        .code(10);
}

#[test]
fn environment_overrides_default_port() {
    let home = tempdir().unwrap();
    let output = data_logger(&home)
        .env("DATA_LOGGER_PORT", "8123")
        .arg("link-code")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let code = link_code_from(&output);

    data_logger(&home)
        .args(["decode", &code])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"port\": 8123"));
}
