//! Runtime entrypoints.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::bootstrap::{build_scheduler, open_store};
use crate::adapter::outbound::memory::MemoryCumulativeStore;
use crate::application::report::{market_flow, MarketFlowSummary};
use crate::domain::MarketId;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Run the poll loop until `shutdown` flips to true.
///
/// With `ephemeral`, totals live in memory and are lost on exit.
///
/// # Errors
/// Returns an error only if the store cannot be opened.
pub async fn run_with_shutdown(
    config: Config,
    shutdown: watch::Receiver<bool>,
    ephemeral: bool,
) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        interval_ms = config.poll.interval_ms,
        ephemeral,
        "Starting stakeflow"
    );

    if ephemeral {
        let store = Arc::new(MemoryCumulativeStore::new());
        build_scheduler(&config, store).run(shutdown).await;
    } else {
        let store = Arc::new(open_store(&config)?);
        build_scheduler(&config, store).run(shutdown).await;
    }

    info!("stakeflow stopped");
    Ok(())
}

/// Read the cumulative view of one market from the configured database.
///
/// # Errors
/// Returns an error if the store cannot be opened or read.
pub async fn show_market(config: &Config, market_id: &MarketId) -> Result<MarketFlowSummary> {
    let store = open_store(config)?;
    Ok(market_flow(&store, market_id).await?)
}
