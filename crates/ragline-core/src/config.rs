//! Client endpoint configuration
//!
//! The core consumes a single base address; both transport URLs are derived
//! from it.

use thiserror::Error;
use url::Url;

/// Environment variable holding the pipeline base URL.
pub const API_URL_ENV: &str = "RAGLINE_API_URL";

/// Base URL used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8082";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported URL scheme: {0} (expected http or https)")]
    UnsupportedScheme(String),
}

/// Resolved endpoint configuration for one client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base: Url,
}

impl ClientConfig {
    /// Parse a base URL, trimming any trailing slash.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url.trim_end_matches('/'))?;
        match base.scheme() {
            "http" | "https" => Ok(Self { base }),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Read the base URL from `RAGLINE_API_URL`, falling back to the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(API_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::new(&value),
            _ => Self::new(DEFAULT_API_URL),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Endpoint for the SSE transport (query parameters are added per request).
    pub fn stream_url(&self) -> Url {
        self.endpoint("/api/stream")
    }

    /// Endpoint for the WebSocket transport; `http` maps to `ws`, `https` to `wss`.
    pub fn ws_url(&self) -> Url {
        let mut url = self.endpoint("/ws/query");
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http<->ws are both special schemes, so this cannot fail
        let _ = url.set_scheme(scheme);
        url
    }

    /// Append an endpoint path to the base, keeping any path prefix the
    /// base URL carries (e.g. `http://host/rag` -> `http://host/rag/api/stream`).
    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL).expect("default API URL is valid")
    }
}
