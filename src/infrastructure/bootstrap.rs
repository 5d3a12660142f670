//! Infrastructure bootstrap helpers for runtime wiring.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::adapter::outbound::exchange::HttpFeed;
use crate::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteCumulativeStore};
use crate::adapter::outbound::wire::WireParser;
use crate::application::scheduler::{PollScheduler, SchedulerSettings};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::store::CumulativeStore;

/// Open the SQLite store, creating its directory and running migrations.
///
/// # Errors
/// Returns an error if the directory, pool or migrations fail.
pub fn open_store(config: &Config) -> Result<SqliteCumulativeStore> {
    if let Some(parent) = Path::new(&config.database).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = create_pool(&config.database)?;
    run_migrations(&pool)?;
    info!(database = %config.database, "Database initialized");
    Ok(SqliteCumulativeStore::new(pool))
}

/// Scheduler settings derived from configuration.
///
/// Discovery issues one request per sport, so its bound scales with the
/// number of sports.
#[must_use]
pub fn scheduler_settings(config: &Config) -> SchedulerSettings {
    let requests = u32::try_from(config.feed.sport_ids.len().max(1)).unwrap_or(u32::MAX);
    let fetch_timeout = Duration::from_millis(config.feed.timeout_ms);
    SchedulerSettings {
        poll: config.poll.clone(),
        lifecycle: config.lifecycle.clone(),
        parser: WireParser::new(config.wire.clone()),
        fetch_timeout,
        discovery_timeout: fetch_timeout.saturating_mul(requests),
    }
}

/// Build the scheduler over the HTTP feeds and the given store.
pub fn build_scheduler<S: CumulativeStore>(config: &Config, store: Arc<S>) -> PollScheduler<S> {
    let feed = Arc::new(HttpFeed::from_config(&config.feed));
    info!(
        events_url = %config.feed.events_url,
        market_data_url = %config.feed.market_data_url,
        sports = ?config.feed.sport_ids,
        authenticated = config.feed.auth_token.is_some(),
        "Feeds configured"
    );
    PollScheduler::new(feed.clone(), feed, store, scheduler_settings(config))
}
