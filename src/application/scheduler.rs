//! Fixed-cadence poll loop.
//!
//! Each tick refreshes discovery when due, applies go-live resets, fetches
//! raw strings for every active market in one batch, and folds each parsed
//! snapshot into the store. Failures are confined to the market (parse,
//! persistence) or the tick (fetch) they occur in; the loop itself only
//! stops on shutdown.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::{LifecycleConfig, PollConfig};
use super::flow::FlowEngine;
use super::lifecycle::LifecycleManager;
use crate::adapter::outbound::wire::WireParser;
use crate::domain::{MarketId, MarketSnapshot, SelectionId};
use crate::error::{FetchError, PersistenceError};
use crate::port::outbound::feed::{DiscoveryFeed, MarketDataFeed};
use crate::port::outbound::store::CumulativeStore;

/// Outcome counters of one tick.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub discovery_refreshed: bool,
    pub discovery_failed: bool,
    pub resets: usize,
    pub markets_requested: usize,
    pub markets_updated: usize,
    pub selections_updated: usize,
    pub missing: usize,
    pub parse_failures: usize,
    pub persistence_failures: usize,
    pub fetch_failed: bool,
}

/// Counters accumulated between periodic summaries.
#[derive(Debug, Default, Clone, Copy)]
struct SummaryWindow {
    ticks: u64,
    markets_updated: usize,
    selections_updated: usize,
    missing: usize,
    parse_failures: usize,
    persistence_failures: usize,
    fetch_failures: usize,
}

impl SummaryWindow {
    fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.markets_updated += report.markets_updated;
        self.selections_updated += report.selections_updated;
        self.missing += report.missing;
        self.parse_failures += report.parse_failures;
        self.persistence_failures += report.persistence_failures;
        self.fetch_failures += usize::from(report.fetch_failed);
    }
}

/// Settings the scheduler needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub poll: PollConfig,
    pub lifecycle: LifecycleConfig,
    pub parser: WireParser,
    /// Upper bound on one market data fetch.
    pub fetch_timeout: Duration,
    /// Upper bound on one discovery refresh.
    pub discovery_timeout: Duration,
}

/// Drives fetch, parse, classify and persist for every active market.
pub struct PollScheduler<S> {
    discovery: Arc<dyn DiscoveryFeed>,
    market_data: Arc<dyn MarketDataFeed>,
    engine: FlowEngine<S>,
    lifecycle: LifecycleManager,
    parser: WireParser,
    poll: PollConfig,
    fetch_timeout: Duration,
    discovery_timeout: Duration,
    last_totals: HashMap<MarketId, f64>,
    ticks: u64,
    window: SummaryWindow,
}

impl<S: CumulativeStore> PollScheduler<S> {
    pub fn new(
        discovery: Arc<dyn DiscoveryFeed>,
        market_data: Arc<dyn MarketDataFeed>,
        store: Arc<S>,
        settings: SchedulerSettings,
    ) -> Self {
        let discovery_interval = chrono::Duration::milliseconds(
            i64::try_from(settings.poll.discovery_interval_ms).unwrap_or(i64::MAX),
        );
        Self {
            discovery,
            market_data,
            engine: FlowEngine::new(store, settings.poll.large_move_threshold),
            lifecycle: LifecycleManager::new(settings.lifecycle, discovery_interval, Utc::now()),
            parser: settings.parser,
            poll: settings.poll,
            fetch_timeout: settings.fetch_timeout,
            discovery_timeout: settings.discovery_timeout,
            last_totals: HashMap::new(),
            ticks: 0,
            window: SummaryWindow::default(),
        }
    }

    #[must_use]
    pub const fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    #[must_use]
    pub const fn engine(&self) -> &FlowEngine<S> {
        &self.engine
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick at the current time.
    pub async fn tick(&mut self) -> TickReport {
        self.tick_at(Utc::now()).await
    }

    /// Run one tick as if the clock read `now`.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        if self.lifecycle.discovery_due(now) {
            self.refresh_discovery(now, &mut report).await;
        }
        self.lifecycle.advance_clock(now);
        report.resets = self.lifecycle.perform_resets(self.engine.store().as_ref()).await;

        let active = self.lifecycle.active_markets();
        report.markets_requested = active.len();
        if !active.is_empty() {
            self.poll_markets(&active, now, &mut report).await;
        }

        self.finish_tick(&report);
        report
    }

    async fn refresh_discovery(&mut self, now: DateTime<Utc>, report: &mut TickReport) {
        let discovered = with_timeout(self.discovery_timeout, self.discovery.discover()).await;
        match discovered {
            Ok(markets) => {
                report.discovery_refreshed = true;
                let changes = self.lifecycle.reconcile(&markets, now);
                for market_id in &changes.finished {
                    self.engine.forget_market(market_id);
                    self.last_totals.remove(market_id);
                }
                debug!(
                    feed = self.discovery.name(),
                    discovered = markets.len(),
                    tracked = self.lifecycle.len(),
                    "Discovery refreshed"
                );
            }
            Err(e) => {
                report.discovery_failed = true;
                warn!(feed = self.discovery.name(), error = %e, "Discovery failed, keeping registry");
            }
        }
    }

    async fn poll_markets(
        &mut self,
        active: &[MarketId],
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) {
        let raw = match with_timeout(self.fetch_timeout, self.market_data.fetch_raw(active)).await
        {
            Ok(raw) => raw,
            Err(e) => {
                report.fetch_failed = true;
                warn!(
                    feed = self.market_data.name(),
                    markets = active.len(),
                    error = %e,
                    "Market data fetch failed"
                );
                return;
            }
        };

        let snapshots = self.parse_batch(active, &raw, report);
        let work: Vec<(MarketSnapshot, HashMap<SelectionId, String>)> = snapshots
            .into_iter()
            .map(|snapshot| {
                let labels = self.lifecycle.resolve_labels(&snapshot);
                (snapshot, labels)
            })
            .collect();

        let engine = &self.engine;
        let results: Vec<(MarketId, Option<f64>, Result<usize, PersistenceError>)> =
            stream::iter(work)
                .map(|(snapshot, labels)| async move {
                    let result = engine
                        .apply(&snapshot, &labels, now)
                        .await
                        .map(|states| states.len());
                    (snapshot.market_id().clone(), snapshot.total_matched(), result)
                })
                .buffer_unordered(self.poll.max_concurrency)
                .collect()
                .await;

        for (market_id, total_matched, result) in results {
            match result {
                Ok(count) => {
                    report.markets_updated += 1;
                    report.selections_updated += count;
                    self.lifecycle.mark_polled(&market_id, now);
                    self.track_total(&market_id, total_matched);
                }
                Err(e) => {
                    report.persistence_failures += 1;
                    warn!(market_id = %market_id, error = %e, "Failed to persist market flow");
                }
            }
        }
    }

    /// Parse raw strings and keep one snapshot per requested market.
    fn parse_batch(
        &self,
        active: &[MarketId],
        raw: &[String],
        report: &mut TickReport,
    ) -> Vec<MarketSnapshot> {
        let mut by_market: HashMap<MarketId, MarketSnapshot> = HashMap::with_capacity(raw.len());

        for payload in raw {
            match self.parser.parse(payload) {
                Ok(snapshot) => {
                    if active.contains(snapshot.market_id()) {
                        by_market.insert(snapshot.market_id().clone(), snapshot);
                    } else {
                        debug!(market_id = %snapshot.market_id(), "Ignoring unrequested market");
                    }
                }
                Err(e) => {
                    report.parse_failures += 1;
                    let hint = payload
                        .split(self.parser.layout().delimiter)
                        .next()
                        .unwrap_or_default();
                    warn!(market_hint = hint, error = %e, "Failed to parse market data");
                }
            }
        }

        for market_id in active {
            if !by_market.contains_key(market_id) {
                report.missing += 1;
                debug!(market_id = %market_id, "No market data this tick");
            }
        }

        by_market.into_values().collect()
    }

    fn track_total(&mut self, market_id: &MarketId, total_matched: Option<f64>) {
        let Some(total) = total_matched else {
            return;
        };
        if let Some(previous) = self.last_totals.insert(market_id.clone(), total) {
            let delta = total - previous;
            if delta != 0.0 {
                debug!(market_id = %market_id, total_matched = total, delta, "Matched total changed");
            }
        }
    }

    fn finish_tick(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.window.record(report);
        debug!(tick = self.ticks, ?report, "Tick complete");

        if self.poll.summary_every > 0 && self.ticks % self.poll.summary_every == 0 {
            let (scheduled, live) = self.lifecycle.phase_counts();
            let window = std::mem::take(&mut self.window);
            info!(
                tick = self.ticks,
                scheduled,
                live,
                ticks = window.ticks,
                markets_updated = window.markets_updated,
                selections_updated = window.selections_updated,
                missing = window.missing,
                parse_failures = window.parse_failures,
                persistence_failures = window.persistence_failures,
                fetch_failures = window.fetch_failures,
                "Poll summary"
            );
        }
    }

    /// Tick until `shutdown` flips to true or its sender is dropped.
    ///
    /// The sleep between ticks is shortened by the time the tick took, so
    /// the cadence does not drift. A tick in flight always completes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let interval = Duration::from_millis(self.poll.interval_ms);
        info!(
            interval_ms = self.poll.interval_ms,
            discovery_interval_ms = self.poll.discovery_interval_ms,
            "Poll loop started"
        );

        loop {
            if *shutdown.borrow() {
                info!("Shutdown signal received");
                break;
            }

            let started = Instant::now();
            self.tick().await;
            let pause = interval.saturating_sub(started.elapsed());

            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown channel closed");
                        break;
                    }
                }
            }
        }

        info!(ticks = self.ticks, "Poll loop stopped");
    }
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
