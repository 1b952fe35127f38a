use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// What an append does when the live buffer is at `max_buffered_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest item still in the live buffer.
    DropOldest,
    /// Discard the arriving item.
    #[default]
    DropNewest,
}

/// How the consumer waits while the live buffer is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeStrategy {
    /// Sleep one backoff interval, then re-poll.
    #[default]
    Poll,
    /// Wait on a condition variable signalled by appends and shutdown,
    /// with the backoff interval as timeout.
    Notify,
}

/// Configuration of the hand-off queue and its consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Idle wait between polls of an empty queue, in milliseconds (default: 250).
    pub backoff_ms: u64,

    /// Minimum spacing of statistics samples on the producer path,
    /// in milliseconds (default: 1000). Zero disables sampling.
    pub stats_interval_ms: u64,

    /// Upper bound on the live buffer, or None for unbounded (default).
    pub max_buffered_items: Option<usize>,

    /// Applied when the bound is hit (default: drop newest).
    pub overflow_policy: OverflowPolicy,

    /// Idle wait mechanism (default: poll).
    pub wake_strategy: WakeStrategy,
}

impl HandoffConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backoff_ms == 0 {
            return Err(ConfigError::Invalid("backoff_ms must be positive".into()));
        }
        if self.max_buffered_items == Some(0) {
            return Err(ConfigError::Invalid(
                "max_buffered_items must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_ms > 0).then(|| Duration::from_millis(self.stats_interval_ms))
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            backoff_ms: 250,
            stats_interval_ms: 1000,
            max_buffered_items: None,
            overflow_policy: OverflowPolicy::default(),
            wake_strategy: WakeStrategy::default(),
        }
    }
}

/// Options passed to `CaptureDevice::open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOptions {
    pub promiscuous: bool,
    /// Facility read timeout in milliseconds (default: 1000).
    pub read_timeout_ms: u32,
    /// Maximum bytes captured per item (default: 65535).
    pub snaplen: u32,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            promiscuous: false,
            read_timeout_ms: 1000,
            snaplen: 65535,
        }
    }
}
