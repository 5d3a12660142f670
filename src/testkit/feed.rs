//! Scripted feed doubles.
//!
//! - [`ScriptedDiscovery`] - Returns a settable market list, with queued failures.
//! - [`ScriptedMarketData`] - Serves one raw string per market, records every
//!   request with its start time, and can be slowed down to exercise fetch
//!   timeouts and tick pacing.
//!
//! Both are cheap handles over shared state: keep a clone in the test and
//! hand another to the scheduler as an `Arc<dyn ...>`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::domain::{DiscoveredMarket, MarketId};
use crate::error::FetchError;
use crate::port::outbound::feed::{DiscoveryFeed, MarketDataFeed};

#[derive(Default)]
struct DiscoveryState {
    markets: Vec<DiscoveredMarket>,
    failures: VecDeque<FetchError>,
    calls: usize,
}

/// Discovery feed returning whatever the test last set.
#[derive(Clone, Default)]
pub struct ScriptedDiscovery {
    state: Arc<Mutex<DiscoveryState>>,
}

impl ScriptedDiscovery {
    pub fn new(markets: Vec<DiscoveredMarket>) -> Self {
        let discovery = Self::default();
        discovery.set_markets(markets);
        discovery
    }

    /// Replace the market list served from the next call on.
    pub fn set_markets(&self, markets: Vec<DiscoveredMarket>) {
        self.state.lock().markets = markets;
    }

    /// Fail the next call with `error`.
    pub fn fail_next(&self, error: FetchError) {
        self.state.lock().failures.push_back(error);
    }

    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }
}

#[async_trait]
impl DiscoveryFeed for ScriptedDiscovery {
    async fn discover(&self) -> Result<Vec<DiscoveredMarket>, FetchError> {
        let mut state = self.state.lock();
        state.calls += 1;
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state.markets.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "scripted-discovery"
    }
}

#[derive(Default)]
struct MarketDataState {
    raw: HashMap<MarketId, String>,
    extra: Vec<String>,
    failures: VecDeque<FetchError>,
    delay: Option<Duration>,
    requests: Vec<Vec<MarketId>>,
    request_times: Vec<Instant>,
}

/// Market data feed serving the last raw string set per market.
///
/// Markets without a string are silently omitted from responses.
#[derive(Clone, Default)]
pub struct ScriptedMarketData {
    state: Arc<Mutex<MarketDataState>>,
}

impl ScriptedMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `raw` for `market_id` from the next call on.
    pub fn set_raw(&self, market_id: &str, raw: impl Into<String>) {
        self.state
            .lock()
            .raw
            .insert(MarketId::from(market_id), raw.into());
    }

    /// Stop serving anything for `market_id`.
    pub fn clear_raw(&self, market_id: &str) {
        self.state.lock().raw.remove(&MarketId::from(market_id));
    }

    /// Append a string to every response regardless of the request.
    pub fn push_extra(&self, raw: impl Into<String>) {
        self.state.lock().extra.push(raw.into());
    }

    /// Fail the next call with `error`.
    pub fn fail_next(&self, error: FetchError) {
        self.state.lock().failures.push_back(error);
    }

    /// Sleep for `delay` before answering each call.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().delay = delay;
    }

    /// Market ids of every call so far, in call order.
    pub fn requests(&self) -> Vec<Vec<MarketId>> {
        self.state.lock().requests.clone()
    }

    /// When each call started, on the tokio clock so paused tests see
    /// virtual time.
    pub fn request_times(&self) -> Vec<Instant> {
        self.state.lock().request_times.clone()
    }
}

#[async_trait]
impl MarketDataFeed for ScriptedMarketData {
    async fn fetch_raw(&self, market_ids: &[MarketId]) -> Result<Vec<String>, FetchError> {
        let delay = {
            let mut state = self.state.lock();
            state.requests.push(market_ids.to_vec());
            state.request_times.push(Instant::now());
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        let mut out: Vec<String> = market_ids
            .iter()
            .filter_map(|id| state.raw.get(id).cloned())
            .collect();
        out.extend(state.extra.iter().cloned());
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "scripted-market-data"
    }
}
