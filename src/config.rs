//! Tap configuration
//!
//! Runtime configuration for the Klaviyo tap, loaded from a JSON document.
//! The config is built once, validated, and threaded by reference through
//! every component. No component reads credentials from ambient state.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default Klaviyo v2 API base URL
pub const DEFAULT_API_URL: &str = "https://a.klaviyo.com/api/v2/";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_user_agent() -> String {
    format!("tap-klaviyo/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_min_request_interval_ms() -> u64 {
    // The v2 group-members endpoint tolerates roughly one request per second
    // before answering 429.
    1000
}

/// Configuration for the Klaviyo tap
///
/// Mirrors the recognized settings of the connector:
///
/// ```json
/// {
///   "api_key": "pk_...",
///   "list_ids": ["RduZTr", "Xy12Ab"],
///   "start_date": "2024-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Base URL for the Klaviyo API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Private API key, sent as the `api_key` query parameter
    pub api_key: String,

    /// Earliest record timestamp to consider. Accepted for forward
    /// compatibility; neither endpoint supports server-side filtering yet.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// List identifiers to extract. An empty set is valid and extracts nothing.
    pub list_ids: Vec<String>,

    /// User agent for outbound requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Minimum interval between any two outbound requests, in milliseconds.
    /// Set to 0 to disable client-side throttling.
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

impl TapConfig {
    /// Create a config with defaults for everything but credentials and lists
    pub fn new(api_key: impl Into<String>, list_ids: Vec<String>) -> Self {
        Self {
            api_url: default_api_url(),
            api_key: api_key.into(),
            start_date: None,
            list_ids,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }

    /// Load and validate a config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Load and validate a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::missing_field("api_key"));
        }
        if self.api_url.is_empty() {
            return Err(Error::missing_field("api_url"));
        }
        url::Url::parse(&self.api_url)?;
        if self.list_ids.iter().any(String::is_empty) {
            return Err(Error::invalid_value(
                "list_ids",
                "list identifiers must be non-empty strings",
            ));
        }
        Ok(())
    }

    /// Override the base URL (used by tests against a mock server)
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Override the minimum inter-request interval
    #[must_use]
    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Minimum inter-request interval, or None when throttling is disabled
    pub fn min_request_interval(&self) -> Option<Duration> {
        if self.min_request_interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.min_request_interval_ms))
        }
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}
