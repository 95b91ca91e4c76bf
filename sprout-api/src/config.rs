//! Connection settings for the device service
//!
//! The service base address and the pre-shared access key are the only two
//! external values. Either may be absent; absence disables the features that
//! need it instead of failing.

use std::time::Duration;

/// Environment variable holding the service base address
pub const ENV_API_BASE: &str = "SPROUT_API_BASE";

/// Environment variable holding the pre-shared access key
pub const ENV_API_KEY: &str = "SPROUT_API_KEY";

/// Connection settings for [`crate::PlantClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base address, e.g. `http://raspberrypi.local:8000`
    /// Default: None
    pub base_url: Option<String>,

    /// Pre-shared key sent with every action and capture request
    /// Default: None
    pub api_key: Option<String>,

    /// Per-request timeout
    /// Default: 5 seconds
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Create a config with both values set
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Read `SPROUT_API_BASE` and `SPROUT_API_KEY` from the environment
    ///
    /// Blank values are treated as absent.
    pub fn from_env() -> Self {
        Self {
            base_url: non_blank(std::env::var(ENV_API_BASE).ok()),
            api_key: non_blank(std::env::var(ENV_API_KEY).ok()),
            ..Default::default()
        }
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Base address, if one is configured and non-blank
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Access key, if one is configured and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
