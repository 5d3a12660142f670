//! Exchange feed configuration.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ConfigError;

/// Endpoints and HTTP settings for the upstream feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Event list endpoint used for discovery.
    #[serde(default = "default_events_url")]
    pub events_url: String,

    /// Batched market data endpoint.
    #[serde(default = "default_market_data_url")]
    pub market_data_url: String,

    /// Sport ids queried on each discovery refresh.
    /// Empty means a single unfiltered request.
    #[serde(default = "default_sport_ids")]
    pub sport_ids: Vec<u32>,

    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Extra static headers sent with every request (origin, referer, ...).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// User agent override.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Bearer token loaded from `STAKEFLOW_FEED_TOKEN` at runtime (never from config file).
    #[serde(skip)]
    pub auth_token: Option<String>,
}

fn default_events_url() -> String {
    "https://api.d99exch.com/api/guest/event_list".into()
}

fn default_market_data_url() -> String {
    "https://odds.o99exch.com/ws/getMarketDataNew".into()
}

fn default_sport_ids() -> Vec<u32> {
    // Cricket, soccer, tennis, horse racing
    vec![4, 1, 2, 7]
}

const fn default_timeout_ms() -> u64 {
    3_000
}

const fn default_connect_timeout_ms() -> u64 {
    2_000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            events_url: default_events_url(),
            market_data_url: default_market_data_url(),
            sport_ids: default_sport_ids(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            headers: BTreeMap::new(),
            user_agent: None,
            auth_token: None,
        }
    }
}

impl FeedConfig {
    /// Validate endpoints and timeouts.
    ///
    /// # Errors
    /// Returns an error for unparsable URLs or zero timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("feed.events_url", &self.events_url),
            ("feed.market_data_url", &self.market_data_url),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingField { field });
            }
            url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            })?;
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.timeout_ms",
                reason: "must be greater than 0".into(),
            });
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.connect_timeout_ms",
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}
