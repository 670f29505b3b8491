//! Engine configuration
//!
//! Defaults can be overridden from environment variables or a YAML document.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::EngineError;

/// Refresh batching window, in milliseconds
pub const ENV_REFRESH_BATCH_WINDOW_MS: &str = "TRELLIS_REFRESH_BATCH_WINDOW_MS";
/// Per-action time budget, in milliseconds; `0` disables it
pub const ENV_ACTION_TIMEOUT_MS: &str = "TRELLIS_ACTION_TIMEOUT_MS";
/// `tracing-subscriber` filter directive
pub const ENV_LOG_FILTER: &str = "TRELLIS_LOG_FILTER";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window during which refresh requests are coalesced
    #[serde(default = "default_refresh_batch_window_ms")]
    pub refresh_batch_window_ms: u64,

    /// Time budget for a single action
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,

    /// Log filter
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_refresh_batch_window_ms() -> u64 {
    50
}

fn default_action_timeout_ms() -> u64 {
    30_000
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_batch_window_ms: default_refresh_batch_window_ms(),
            action_timeout_ms: default_action_timeout_ms(),
            log_filter: default_log_filter(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn load() -> Self {
        Self::default().with_overrides(|name| env::var(name).ok())
    }

    /// Parse a YAML document; missing fields take their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply overrides from any name → value source
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(window) = lookup(ENV_REFRESH_BATCH_WINDOW_MS) {
            match window.parse::<u64>() {
                Ok(ms) => self.refresh_batch_window_ms = ms,
                Err(_) => warn!("Invalid {} value: {}", ENV_REFRESH_BATCH_WINDOW_MS, window),
            }
        }

        if let Some(timeout) = lookup(ENV_ACTION_TIMEOUT_MS) {
            match timeout.parse::<u64>() {
                Ok(ms) => self.action_timeout_ms = ms,
                Err(_) => warn!("Invalid {} value: {}", ENV_ACTION_TIMEOUT_MS, timeout),
            }
        }

        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            if filter.trim().is_empty() {
                warn!("Empty {} value, keeping '{}'", ENV_LOG_FILTER, self.log_filter);
            } else {
                self.log_filter = filter;
            }
        }

        info!(
            "Engine configuration: refresh window {} ms, action timeout {} ms",
            self.refresh_batch_window_ms, self.action_timeout_ms
        );
        self
    }

    /// The refresh batching window
    pub fn refresh_batch_window(&self) -> Duration {
        Duration::from_millis(self.refresh_batch_window_ms)
    }

    /// The per-action timeout, or `None` when disabled
    pub fn action_timeout(&self) -> Option<Duration> {
        (self.action_timeout_ms > 0).then(|| Duration::from_millis(self.action_timeout_ms))
    }
}
