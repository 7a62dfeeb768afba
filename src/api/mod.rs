//! Access to the external ledger backend from the proxy server.
//!
//! The `Upstream` trait has one operation per backend endpoint. `HttpUpstream` talks to the real
//! backend over HTTP with a bearer token. `TestUpstream` keeps everything in memory so that the
//! whole application can run, top-to-bottom, without a backend.

mod http;
mod test_upstream;

use crate::model::{DropdownKind, Envelope, FormDataRequest};
use crate::{ProxyConfig, Result};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub(crate) use http::HttpUpstream;
pub(crate) use test_upstream::TestUpstream;

/// When this variable is set and non-empty, the server uses the in-memory backend.
pub const TEST_MODE_ENV: &str = "CASHCAL_IN_TEST_MODE";

/// The message returned to callers when a route is missing its configuration.
pub const MISSING_CONFIG_MESSAGE: &str = "unable to load .env";

/// Selects which `Upstream` implementation the server uses.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Forward to the backend configured in the environment.
    #[default]
    Http,
    /// Serve from an in-memory backend.
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// The backend operations the proxy routes forward to. Each returns the backend's envelope as
/// it was received, or an error when no envelope could be obtained.
#[async_trait::async_trait]
pub trait Upstream: Send + Sync {
    /// Lists the options of one dropdown.
    async fn dropdown(&self, kind: DropdownKind) -> std::result::Result<Envelope, UpstreamError>;

    /// Finds events by id. The backend answers with a list.
    async fn filter(&self, id: &str) -> std::result::Result<Envelope, UpstreamError>;

    /// Creates the event when `request.id` is empty, updates it otherwise.
    async fn upsert(
        &self,
        request: &FormDataRequest,
    ) -> std::result::Result<Envelope, UpstreamError>;

    /// Lists the events of a month (`month` is 1-based) as seen from `timezone`, an IANA zone
    /// name. `None` uses the configured zone.
    async fn month(
        &self,
        year: i32,
        month: u32,
        timezone: Option<&str>,
    ) -> std::result::Result<Envelope, UpstreamError>;

    /// Sums the events of a month per type and category, like `month`.
    async fn sum(
        &self,
        year: i32,
        month: u32,
        timezone: Option<&str>,
    ) -> std::result::Result<Envelope, UpstreamError>;
}

/// Why the upstream produced no envelope.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// A required endpoint or the token is not configured. Nothing was sent.
    #[error("{MISSING_CONFIG_MESSAGE}")]
    MissingConfig(&'static str),

    #[error("Failed to reach the backend at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("The backend at {url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("The backend at {url} did not return a response envelope: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Creates the `Upstream` selected by `mode`. `event_limit` only applies to the in-memory
/// backend; the real backend enforces its own.
pub fn upstream(config: ProxyConfig, mode: Mode, event_limit: usize) -> Result<Arc<dyn Upstream>> {
    match mode {
        Mode::Http => {
            let missing = config.missing();
            if !missing.is_empty() {
                tracing::warn!(
                    "These variables are not set, the routes using them will fail: {}",
                    missing.join(", ")
                );
            }
            Ok(Arc::new(HttpUpstream::new(config)?))
        }
        Mode::Test => {
            debug!("Serving from the in-memory backend");
            Ok(Arc::new(TestUpstream::new(event_limit)))
        }
    }
}
