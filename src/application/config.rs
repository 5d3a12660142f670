//! Poll and lifecycle configuration.

use serde::Deserialize;

use crate::domain::MarketId;
use crate::error::ConfigError;

const MIN_INTERVAL_MS: u64 = 50;
const MAX_INTERVAL_MS: u64 = 60_000;

/// Cadence and fan-out of the poll loop.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Target time between tick starts in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Time between discovery refreshes in milliseconds.
    #[serde(default = "default_discovery_interval_ms")]
    pub discovery_interval_ms: u64,
    /// Markets parsed and applied concurrently within one tick.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Log a summary every this many ticks. Zero disables it.
    #[serde(default = "default_summary_every")]
    pub summary_every: u64,
    /// Absolute stake change above which a move is logged at info.
    #[serde(default = "default_large_move_threshold")]
    pub large_move_threshold: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            discovery_interval_ms: default_discovery_interval_ms(),
            max_concurrency: default_max_concurrency(),
            summary_every: default_summary_every(),
            large_move_threshold: default_large_move_threshold(),
        }
    }
}

const fn default_interval_ms() -> u64 {
    1_000
}

const fn default_discovery_interval_ms() -> u64 {
    15_000
}

const fn default_max_concurrency() -> usize {
    8
}

const fn default_summary_every() -> u64 {
    50
}

const fn default_large_move_threshold() -> f64 {
    100.0
}

impl PollConfig {
    /// Validate cadence bounds.
    ///
    /// # Errors
    /// Returns an error for an out-of-range interval, a discovery interval
    /// shorter than the tick interval, or zero concurrency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&self.interval_ms) {
            return Err(ConfigError::InvalidValue {
                field: "poll.interval_ms",
                reason: format!("must be between {MIN_INTERVAL_MS} and {MAX_INTERVAL_MS}"),
            });
        }
        if self.discovery_interval_ms < self.interval_ms {
            return Err(ConfigError::InvalidValue {
                field: "poll.discovery_interval_ms",
                reason: "must be >= interval_ms".into(),
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll.max_concurrency",
                reason: "must be greater than 0".into(),
            });
        }
        if !self.large_move_threshold.is_finite() || self.large_move_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "poll.large_move_threshold",
                reason: "must be a non-negative number".into(),
            });
        }
        Ok(())
    }
}

/// A market tracked regardless of what discovery reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WhitelistEntry {
    pub market_id: MarketId,
    /// Event title used for team labels.
    #[serde(default)]
    pub name: String,
}

/// Which discovered markets are tracked and how go-live is detected.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Poll scheduled markets before they go live. Their pre-live totals
    /// are discarded at go-live either way.
    #[serde(default = "default_true")]
    pub track_scheduled: bool,
    /// Treat a market whose scheduled start has passed as live.
    #[serde(default = "default_true")]
    pub time_fallback: bool,
    /// Markets always tracked as live and never evicted.
    #[serde(default)]
    pub whitelist: Vec<WhitelistEntry>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            track_scheduled: true,
            time_fallback: true,
            whitelist: Vec::new(),
        }
    }
}

const fn default_true() -> bool {
    true
}

impl LifecycleConfig {
    /// Validate whitelist entries.
    ///
    /// # Errors
    /// Returns an error for a blank or duplicated market id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.whitelist {
            if entry.market_id.as_str().trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "lifecycle.whitelist.market_id",
                });
            }
            if !seen.insert(entry.market_id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "lifecycle.whitelist",
                    reason: format!("duplicate market id {}", entry.market_id),
                });
            }
        }
        Ok(())
    }
}
