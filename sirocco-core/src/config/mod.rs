//! Configuration management.
//!
//! This module provides the ingestion configuration consumed by the
//! coordinator, with serde field defaults and environment variable
//! overrides for deployment-time tuning.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required configuration field is missing or empty.
    #[error("[Config] Missing field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// Configuration value is invalid.
    #[error("[Config] Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field with the invalid value.
        field: String,
        /// Reason why the value is invalid.
        reason: String,
    },
}

/// Default polling interval between prefix re-lists.
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 30_000;

fn default_polling_interval_ms() -> u64 {
    DEFAULT_POLLING_INTERVAL_MS
}

/// Ingestion configuration.
///
/// `queue_url` selects the incremental discovery mode: present means
/// event-driven (a notification queue is long-polled for new objects),
/// absent means polling (the prefix is re-listed on an interval).
///
/// # Example YAML
///
/// ```yaml
/// bucket: market-data
/// prefix: coinbase
/// region: us-east-1
/// queue_url: https://sqs.us-east-1.amazonaws.com/123456789/market-data-events
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Object-store bucket holding the trade payloads.
    pub bucket: String,

    /// Key prefix to ingest under (empty means the whole bucket).
    #[serde(default)]
    pub prefix: String,

    /// Object-store region, when the backend needs one.
    #[serde(default)]
    pub region: Option<String>,

    /// Notification queue URL; present selects event-driven discovery.
    #[serde(default)]
    pub queue_url: Option<String>,

    /// Interval between prefix re-lists in polling mode.
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefix: String::new(),
            region: None,
            queue_url: None,
            polling_interval_ms: default_polling_interval_ms(),
        }
    }
}

impl IngestConfig {
    /// Creates a configuration for the given bucket with all defaults.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Returns true if incremental discovery should be event-driven.
    #[must_use]
    pub fn is_event_driven(&self) -> bool {
        self.queue_url.is_some()
    }

    /// Returns the polling interval as a `Duration`.
    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the bucket is empty or the polling interval
    /// is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.is_empty() {
            return Err(ConfigError::MissingField {
                field: "bucket".to_string(),
            });
        }
        if self.polling_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// Recognized variables:
    ///
    /// - `SIROCCO_BUCKET`
    /// - `SIROCCO_PREFIX`
    /// - `SIROCCO_REGION`
    /// - `SIROCCO_QUEUE_URL`
    /// - `SIROCCO_POLLING_INTERVAL_MS`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SIROCCO_BUCKET") {
            self.bucket = v;
        }
        if let Ok(v) = std::env::var("SIROCCO_PREFIX") {
            self.prefix = v;
        }
        if let Ok(v) = std::env::var("SIROCCO_REGION") {
            if !v.is_empty() {
                self.region = Some(v);
            }
        }
        if let Ok(v) = std::env::var("SIROCCO_QUEUE_URL") {
            if !v.is_empty() {
                self.queue_url = Some(v);
            }
        }
        if let Ok(v) = std::env::var("SIROCCO_POLLING_INTERVAL_MS") {
            if let Ok(ms) = v.parse() {
                self.polling_interval_ms = ms;
            }
        }
    }
}
