//! Connection settings for the academy backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "ACADEMY_API_URL";

/// Base URL used when `ACADEMY_API_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8009";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Academy backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend root, without a trailing slash
    pub base_url: String,
    /// Upper bound on each request, connect to last byte
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let base_url =
            std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url)
    }
}

impl ApiConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific backend
    pub fn new(base_url: &str) -> Self {
        ApiConfig {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("academy-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Absolute URL for `path` (which starts with `/`).
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
