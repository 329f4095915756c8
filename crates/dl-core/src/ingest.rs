//! Sample ingestion.
//!
//! [`IngestService`] is the only writer of the data file: it owns one
//! [`TabularStore`] behind a mutex, so however requests arrive, records are
//! written one at a time. [`IngestService::route`] is the HTTP-agnostic
//! part of the endpoint: it maps method, URL and body to a [`Reply`].

use std::path::Path;
use std::sync::Mutex;

use dl_common::Record;
use dl_store::{EncodeMode, StoreOptions, TabularStore};
use tracing::{debug, error, info, warn};

use crate::error::{CoreError, Result};

/// Status and plain-text body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn ok() -> Self {
        Self::new(200, "OK")
    }
}

/// Single-writer front of a data file.
#[derive(Debug)]
pub struct IngestService {
    ingest_path: String,
    store: Mutex<TabularStore>,
}

impl IngestService {
    /// Open the data file and serve samples posted to `ingest_path`.
    pub fn open(
        data_file: &Path,
        separator: char,
        strict_values: bool,
        ingest_path: impl Into<String>,
    ) -> Result<Self> {
        let mode = if strict_values {
            EncodeMode::Reject
        } else {
            EncodeMode::DropUnsupported
        };
        let store =
            TabularStore::open_with_options(data_file, StoreOptions::new(separator).with_encode_mode(mode))?;
        Ok(Self {
            ingest_path: ingest_path.into(),
            store: Mutex::new(store),
        })
    }

    pub fn ingest_path(&self) -> &str {
        &self.ingest_path
    }

    /// Decode a JSON object body and append it as one row.
    ///
    /// Returns the number of fields written, not counting the timestamp.
    pub fn ingest_json(&self, body: &[u8]) -> Result<usize> {
        let record = Record::from_json_slice(body)?;
        self.ingest(&record)?;
        Ok(record.len())
    }

    pub fn ingest(&self, record: &Record) -> Result<()> {
        for (name, value) in record.iter().filter(|(_, v)| !v.is_supported()) {
            warn!(field = name, kind = value.kind(), "sample field has no cell representation");
        }

        let mut store = self.store.lock().map_err(|_| CoreError::StoreUnavailable)?;
        store.write_record(record)?;
        Ok(())
    }

    /// Handle one request to the endpoint.
    pub fn route(&self, method: &str, url: &str, body: &[u8]) -> Reply {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path != self.ingest_path {
            debug!(method, url, "no route");
            return Reply::new(404, "not found");
        }
        if !method.eq_ignore_ascii_case("POST") {
            return Reply::new(405, "method not allowed");
        }

        match self.ingest_json(body) {
            Ok(fields) => {
                info!(fields, "received data sample");
                Reply::ok()
            }
            Err(e) if e.is_client_error() => {
                warn!(error = %e, "rejected data sample");
                Reply::new(400, e.to_string())
            }
            Err(e) => {
                error!(error = %e, "could not log data");
                Reply::new(500, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn service(tmp: &TempDir, strict: bool) -> IngestService {
        IngestService::open(&tmp.path().join("data.csv"), ',', strict, "/data").unwrap()
    }

    fn data(tmp: &TempDir) -> Vec<String> {
        fs::read_to_string(tmp.path().join("data.csv"))
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn post_to_ingest_path_appends_row() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, false);

        let reply = svc.route("POST", "/data", br#"{"temp": 21.5, "humid": 60}"#);
        assert_eq!(reply, Reply::ok());

        let lines = data(&tmp);
        assert_eq!(lines[0], "Timestamp,temp,humid");
        assert!(lines[1].ends_with(",21.500000,60"));
    }

    #[test]
    fn query_string_is_ignored_for_routing() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, false);
        assert_eq!(svc.route("post", "/data?device=7", br#"{"a": 1}"#).status, 200);
    }

    #[test]
    fn unknown_path_and_method() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, false);
        assert_eq!(svc.route("POST", "/other", b"{}").status, 404);
        assert_eq!(svc.route("GET", "/data", b"").status, 405);
        assert_eq!(svc.route("POST", "/data/", b"{}").status, 404);
    }

    #[test]
    fn malformed_bodies_are_bad_requests() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, false);

        let reply = svc.route("POST", "/data", b"{oops");
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("invalid JSON"));

        let reply = svc.route("POST", "/data", b"[1, 2]");
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("array"));
    }

    #[test]
    fn strict_values_reject_nulls() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, true);
        let reply = svc.route("POST", "/data", br#"{"a": null}"#);
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("'a'"));
    }

    #[test]
    fn field_names_with_separator_or_newline_are_bad_requests() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, false);
        assert_eq!(svc.route("POST", "/data", br#"{"a": 1}"#).status, 200);

        let reply = svc.route("POST", "/data", br#"{"a,b": 1}"#);
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("separator"));

        let reply = svc.route("POST", "/data", br#"{"x\n999": 1}"#);
        assert_eq!(reply.status, 400);

        let lines = data(&tmp);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Timestamp,a");
    }

    #[test]
    fn lenient_values_write_empty_cells() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, false);
        assert_eq!(svc.route("POST", "/data", br#"{"a": null, "b": 2}"#).status, 200);
        let lines = data(&tmp);
        assert_eq!(lines[0], "Timestamp,a,b");
        assert!(lines[1].ends_with(",,2"));
    }

    #[test]
    fn store_failures_are_server_errors() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, false);
        // Block the staging file so the first header migration fails.
        fs::create_dir(tmp.path().join("data.csv.tmp")).unwrap();

        let reply = svc.route("POST", "/data", br#"{"a": 1}"#);
        assert_eq!(reply.status, 500);
        assert!(reply.body.contains("staging file"));
    }

    #[test]
    fn concurrent_ingest_is_serialised() {
        let tmp = TempDir::new().unwrap();
        let svc = std::sync::Arc::new(service(&tmp, false));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                std::thread::spawn(move || {
                    let body = format!(r#"{{"worker{i}": {i}}}"#);
                    svc.ingest_json(body.as_bytes()).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let lines = data(&tmp);
        assert_eq!(lines.len(), 9);
        let header: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(header.len(), 9);
        for row in &lines[1..] {
            assert!(row.split(',').count() <= header.len());
        }
    }
}
