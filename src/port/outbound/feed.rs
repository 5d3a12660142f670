//! Upstream feed ports.
//!
//! The core only ever sees two things from upstream: the discovery list
//! and one raw wire string per requested market. Transport, headers and
//! session refresh stay behind these traits; every failure surfaces as a
//! [`FetchError`].

use async_trait::async_trait;

use crate::domain::{DiscoveredMarket, MarketId};
use crate::error::FetchError;

/// Source of the market list with names, liveness and start times.
#[async_trait]
pub trait DiscoveryFeed: Send + Sync {
    /// Fetch every market the upstream currently lists.
    async fn discover(&self) -> Result<Vec<DiscoveredMarket>, FetchError>;

    /// Feed name for logging.
    fn name(&self) -> &'static str;
}

/// Source of raw per-market wire strings.
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    /// Fetch raw strings for a batch of markets in one round trip.
    ///
    /// The result may omit requested markets; absence is not an error.
    async fn fetch_raw(&self, market_ids: &[MarketId]) -> Result<Vec<String>, FetchError>;

    /// Feed name for logging.
    fn name(&self) -> &'static str;
}
