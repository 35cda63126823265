//! Configuration for the search and page-fetch nodes.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Configuration for the search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Full URL of the search endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    /// Client-side timeout in seconds. `None` leaves the transport default.
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
}

fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            timeout_seconds: None,
        }
    }
}

impl SearchConfig {
    /// Creates a new search configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Gets timeout as Duration. Values that are not a positive finite
    /// number of seconds leave the transport default.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.and_then(seconds_to_duration)
    }

    /// Checks that the configured values are usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(seconds) = self.timeout_seconds {
            check_timeout("search.timeout_seconds", seconds)?;
        }
        Ok(())
    }
}

/// Configuration for fetching unsubscribe pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Whether to follow redirects.
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Additional headers to include.
    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,
}

fn default_timeout() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; webnodes-unsubscribe-bot)".to_string()
}

// Accept-Encoding is left to the client so that it can decompress bodies.
fn default_headers() -> HashMap<String, String> {
    HashMap::from([
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        ),
        ("Accept-Language".to_string(), "en-US,en;q=0.5".to_string()),
        ("Connection".to_string(), "keep-alive".to_string()),
    ])
}

fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}

fn check_timeout(field: &str, seconds: f64) -> anyhow::Result<()> {
    if seconds_to_duration(seconds).is_none() {
        anyhow::bail!("{field} must be a positive number of seconds, got {seconds}");
    }
    Ok(())
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            follow_redirects: default_true(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            headers: default_headers(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Enables or disables redirect following.
    #[must_use]
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Gets timeout as Duration, falling back to 30 s when the configured
    /// value is not a positive finite number of seconds.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        seconds_to_duration(self.timeout_seconds)
            .unwrap_or_else(|| Duration::from_secs_f64(default_timeout()))
    }

    /// Checks that the configured values are usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_timeout("fetch.timeout_seconds", self.timeout_seconds)
    }

    /// The full header set sent with every page fetch, user agent included.
    #[must_use]
    pub fn request_headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();
        headers.insert("User-Agent".to_string(), self.user_agent.clone());
        headers
    }
}

/// Combined configuration for all nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodesConfig {
    /// Search node configuration.
    #[serde(default)]
    pub search: SearchConfig,
    /// Page fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl NodesConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid nodes configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.search
            .validate()
            .and_then(|()| self.fetch.validate())
            .context("invalid nodes configuration")
    }

    /// Loads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json_str(&raw)
    }
}
