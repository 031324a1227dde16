//! Research backend endpoint configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_base_url() -> String {
    "http://localhost:8002".to_string()
}

fn default_stream_path() -> String {
    "/api/research/stream".to_string()
}

fn default_review_path() -> String {
    "/api/research/review".to_string()
}

fn default_ingest_path() -> String {
    "/api/ingest/upload".to_string()
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("deepresearch/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Backend origin, e.g. `http://localhost:8002`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Initial research stream; the thread id is appended as a path segment.
    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// Resume endpoint for review decisions.
    #[serde(default = "default_review_path")]
    pub review_path: String,

    /// Document upload endpoint.
    #[serde(default = "default_ingest_path")]
    pub ingest_path: String,

    /// TCP connect timeout. Streams themselves have no overall timeout.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_path: default_stream_path(),
            review_path: default_review_path(),
            ingest_path: default_ingest_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ServerConfig {
    /// Base URL without a trailing slash.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Join the origin and an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.origin(), path.trim_start_matches('/'))
    }

    /// Reject values the HTTP client cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a base URL without an
    /// `http://` or `https://` scheme, or a zero connect timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_scheme = ["http://", "https://"].iter().any(|scheme| {
            self.base_url
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        });
        if !has_scheme {
            return Err(ConfigError::InvalidValue {
                field: "server.base_url".into(),
                reason: format!("'{}' must start with http:// or https://", self.base_url),
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.connect_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
