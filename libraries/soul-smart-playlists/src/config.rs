//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

// A century; keeps the hour count convertible without overflow.
const MAX_STALE_AFTER_HOURS: u64 = 24 * 365 * 100;

/// Smart playlist engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartPlaylistConfig {
    /// Snapshots older than this are rematerialized by the sweeper
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,

    /// Time between sweeper passes
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Number of background worker tasks
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Songs read per catalog query during evaluation
    #[serde(default = "default_scan_chunk_size")]
    pub scan_chunk_size: usize,

    /// Upper bound for one materialization attempt
    #[serde(default = "default_materialize_timeout_secs")]
    pub materialize_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// Backoff for transient storage failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Give up once this much time has passed since the first attempt
    #[serde(default = "default_max_elapsed_secs")]
    pub max_elapsed_secs: u64,
}

fn default_stale_after_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_workers() -> usize {
    4
}

fn default_scan_chunk_size() -> usize {
    500
}

fn default_materialize_timeout_secs() -> u64 {
    120
}

fn default_initial_interval_ms() -> u64 {
    200
}

fn default_max_interval_ms() -> u64 {
    5000
}

fn default_max_elapsed_secs() -> u64 {
    30
}

impl Default for SmartPlaylistConfig {
    fn default() -> Self {
        Self {
            stale_after_hours: default_stale_after_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
            workers: default_workers(),
            scan_chunk_size: default_scan_chunk_size(),
            materialize_timeout_secs: default_materialize_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            max_elapsed_secs: default_max_elapsed_secs(),
        }
    }
}

impl SmartPlaylistConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.stale_after_hours == 0 || self.stale_after_hours > MAX_STALE_AFTER_HOURS {
            return Err(format!(
                "stale_after_hours must be between 1 and {MAX_STALE_AFTER_HOURS}"
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        if self.scan_chunk_size == 0 {
            return Err("scan_chunk_size must be greater than 0".to_string());
        }
        if self.materialize_timeout_secs == 0 {
            return Err("materialize_timeout_secs must be greater than 0".to_string());
        }
        if self.retry.initial_interval_ms == 0 {
            return Err("retry.initial_interval_ms must be greater than 0".to_string());
        }
        if self.retry.max_interval_ms < self.retry.initial_interval_ms {
            return Err("retry.max_interval_ms must be at least retry.initial_interval_ms".to_string());
        }
        Ok(())
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::hours(self.stale_after_hours.min(MAX_STALE_AFTER_HOURS) as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn materialize_timeout(&self) -> Duration {
        Duration::from_secs(self.materialize_timeout_secs)
    }
}
