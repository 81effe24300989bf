//! Configuration for Bizfly clients.
//!
//! [`CloudConfig`] is plain serde data so applications can load it from any
//! source they like; [`ClientBuilder::with_config`](crate::ClientBuilder::with_config)
//! applies it.

use crate::client::RetryPolicy;
use crate::types::{DEFAULT_BASE_URL, DEFAULT_REGION};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Configuration for a Bizfly client instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_retry_delays"))]
pub struct CloudConfig {
    /// API root URL
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Region used for endpoint selection
    #[validate(length(min = 1, max = 32))]
    #[serde(default = "default_region")]
    pub region: String,

    /// Initial project scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Override for the `User-Agent` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Total attempts per request for transient failures
    #[validate(range(min = 1, max = 10))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[validate(range(min = 1, max = 60000))]
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    #[validate(range(min = 1, max = 300_000))]
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Seconds before expiry at which a token is refreshed
    #[validate(range(min = 0, max = 3600))]
    #[serde(default = "default_token_refresh_margin_secs")]
    pub token_refresh_margin_secs: u64,

    /// TCP connect timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_retry_initial_delay_ms() -> u64 {
    1000
}

const fn default_retry_max_delay_ms() -> u64 {
    16000
}

const fn default_token_refresh_margin_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

fn validate_retry_delays(config: &CloudConfig) -> Result<(), ValidationError> {
    if config.retry_max_delay_ms < config.retry_initial_delay_ms {
        return Err(ValidationError::new("retry_max_delay_below_initial"));
    }
    Ok(())
}

impl CloudConfig {
    /// Create a configuration for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            ..Self::default()
        };
        config.check()?;
        Ok(config)
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the failing fields.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Set the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the initial project scope.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the total attempts per request.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the token refresh margin in seconds.
    #[must_use]
    pub const fn with_refresh_margin_secs(mut self, seconds: u64) -> Self {
        self.token_refresh_margin_secs = seconds;
        self
    }

    /// Retry policy described by this configuration.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(self.max_attempts)
            .with_initial_delay(Duration::from_millis(self.retry_initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.retry_max_delay_ms))
    }

    /// Connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Token refresh margin as a chrono Duration.
    ///
    /// Values beyond the representable range saturate at the maximum.
    #[must_use]
    pub fn refresh_margin(&self) -> chrono::Duration {
        i64::try_from(self.token_refresh_margin_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(chrono::Duration::max_value)
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            region: default_region(),
            project_id: None,
            user_agent: None,
            max_attempts: default_max_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            token_refresh_margin_secs: default_token_refresh_margin_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}
