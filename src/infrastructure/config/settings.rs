//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file with environment variable overrides
//! for the database path (`STAKEFLOW_DATABASE`) and the feed token
//! (`STAKEFLOW_FEED_TOKEN`, never read from the file).
//!
//! # Example
//!
//! ```no_run
//! use stakeflow::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::adapter::outbound::exchange::FeedConfig;
use crate::adapter::outbound::wire::WireLayout;
use crate::application::config::{LifecycleConfig, PollConfig};
use crate::error::{ConfigError, Result};

/// Environment variable overriding [`Config::database`].
pub const DATABASE_ENV: &str = "STAKEFLOW_DATABASE";

/// Environment variable holding the feed bearer token.
pub const FEED_TOKEN_ENV: &str = "STAKEFLOW_FEED_TOKEN";

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to SQLite database file.
    ///
    /// Defaults to `/data/stakeflow.db` when a `/data` volume is mounted,
    /// otherwise `data/stakeflow.db` relative to the working directory.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream discovery and market data endpoints.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Poll cadence and concurrency.
    #[serde(default)]
    pub poll: PollConfig,

    /// Market tracking rules and whitelist.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Layout of the positional market data strings.
    #[serde(default)]
    pub wire: WireLayout,
}

fn default_database_path() -> String {
    if Path::new("/data").is_dir() {
        "/data/stakeflow.db".to_string()
    } else {
        "data/stakeflow.db".to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            logging: LoggingConfig::default(),
            feed: FeedConfig::default(),
            poll: PollConfig::default(),
            lifecycle: LifecycleConfig::default(),
            wire: WireLayout::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Applies environment overrides before validating.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails (e.g., an out-of-range poll interval)
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup(DATABASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.database = database;
        }
        self.feed.auth_token = lookup(FEED_TOKEN_ENV).filter(|v| !v.trim().is_empty());
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns the first invalid field found.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected pretty or json, got {:?}", self.logging.format),
            }
            .into());
        }
        self.feed.validate()?;
        self.poll.validate()?;
        self.lifecycle.validate()?;
        self.wire.validate()?;
        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
