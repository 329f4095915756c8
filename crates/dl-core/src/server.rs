//! HTTP front of the ingestion service.
//!
//! Requests are handled one after the other on the calling thread, which
//! keeps the data file single-writer without further coordination.

use std::io::Read;
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use tiny_http::{Request, Response, Server, StatusCode};
use tracing::{debug, error, warn};

use crate::error::{CoreError, Result};
use crate::ingest::{IngestService, Reply};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Consecutive accept failures after which the listener is given up.
pub const MAX_CONSECUTIVE_ACCEPT_ERRORS: u32 = 16;

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Counts accept failures in a row.
#[derive(Debug, Clone, Copy)]
struct AcceptBackoff {
    consecutive: u32,
    limit: u32,
}

impl AcceptBackoff {
    fn new(limit: u32) -> Self {
        Self {
            consecutive: 0,
            limit,
        }
    }

    fn succeeded(&mut self) {
        self.consecutive = 0;
    }

    /// Record a failure; returns true once the limit is reached.
    fn failed(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= self.limit
    }
}

/// Listening socket plus the service it feeds.
pub struct IngestServer {
    server: Server,
    service: IngestService,
}

impl IngestServer {
    /// Listen on `addr` (e.g. `0.0.0.0:8090`).
    pub fn bind(addr: &str, service: IngestService) -> Result<Self> {
        let server = Server::http(addr).map_err(|e| CoreError::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;
        debug!(addr, path = service.ingest_path(), "ingestion endpoint bound");
        Ok(Self { server, service })
    }

    /// Address actually bound, useful when listening on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve requests until the listener keeps failing.
    ///
    /// A single accept error is logged and retried after a short pause;
    /// only [`MAX_CONSECUTIVE_ACCEPT_ERRORS`] failures in a row end the loop.
    pub fn run(&self) -> Result<()> {
        let mut backoff = AcceptBackoff::new(MAX_CONSECUTIVE_ACCEPT_ERRORS);
        loop {
            match self.serve_one() {
                Ok(()) => backoff.succeeded(),
                Err(e) => {
                    if backoff.failed() {
                        error!(error = %e, failures = backoff.consecutive, "giving up on listener");
                        return Err(e);
                    }
                    warn!(error = %e, failures = backoff.consecutive, "could not accept request");
                    thread::sleep(ACCEPT_RETRY_DELAY);
                }
            }
        }
    }

    /// Block for the next request and answer it.
    pub fn serve_one(&self) -> Result<()> {
        let request = self.server.recv()?;
        self.handle(request);
        Ok(())
    }

    fn handle(&self, mut request: Request) {
        let method = request.method().to_string();
        let url = request.url().to_string();

        let mut body = Vec::new();
        let reply = match request
            .as_reader()
            .take(MAX_BODY_BYTES + 1)
            .read_to_end(&mut body)
        {
            Err(e) => Reply {
                status: 400,
                body: format!("could not read request body: {e}"),
            },
            Ok(n) if n as u64 > MAX_BODY_BYTES => Reply {
                status: 413,
                body: "request body too large".to_string(),
            },
            Ok(_) => self.service.route(&method, &url, &body),
        };

        let response =
            Response::from_string(reply.body).with_status_code(StatusCode(reply.status));
        if let Err(e) = request.respond(response) {
            warn!(error = %e, %method, %url, "could not send response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_accept_errors_do_not_stop_the_loop() {
        let mut backoff = AcceptBackoff::new(3);
        assert!(!backoff.failed());
        assert!(!backoff.failed());
        backoff.succeeded();
        assert!(!backoff.failed());
        assert!(!backoff.failed());
        assert!(backoff.failed());
    }

    #[test]
    fn bound_server_reports_its_address() {
        let tmp = tempfile::tempdir().unwrap();
        let service =
            IngestService::open(&tmp.path().join("data.csv"), ',', false, "/data").unwrap();
        let server = IngestServer::bind("127.0.0.1:0", service).unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }
}
