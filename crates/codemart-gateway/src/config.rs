//! # Gateway Configuration
//!
//! The `[gateway]` section of `codemart.toml`.
//!
//! ```toml
//! [gateway]
//! base_url = "https://shop.example.com/wp-json/codemart/v1"
//! timeout_secs = 15
//! max_retries = 3
//! user_agent = "codemart/0.1"
//! ```

use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{GatewayError, GatewayResult};

/// Connection settings for the remote gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Root of the REST API. Endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts for failed reads. Writes are never retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between read retries (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff between read retries (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8080/wp-json/codemart/v1".to_string()
}
fn default_timeout() -> u64 {
    15
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    300
}
fn default_max_backoff() -> u64 {
    5
}
fn default_user_agent() -> String {
    format!("codemart/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            user_agent: default_user_agent(),
        }
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        GatewayConfig {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> GatewayResult<()> {
        self.parsed_base_url()?;

        if self.timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "user_agent must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Parses `base_url`, requiring http(s).
    pub fn parsed_base_url(&self) -> GatewayResult<Url> {
        let url = Url::parse(self.base_url.trim())?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GatewayError::InvalidUrl(format!(
                "Gateway URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(format!(
                "Gateway URL cannot be used as a base: {}",
                self.base_url
            )));
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff policy for read retries.
    pub(crate) fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(self.initial_backoff_ms),
            max_interval: Duration::from_secs(self.max_backoff_secs),
            multiplier: 2.0,
            // Attempts are bounded by max_retries instead
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}
