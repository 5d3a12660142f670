//! Market lifecycle tracking.
//!
//! The [`LifecycleManager`] owns the market registry. It folds discovery
//! reports into per-market phases, resets cumulative totals when a market
//! observed as scheduled goes live, and yields the set of markets to poll.
//!
//! Phase rules:
//! - A newly reported market enters as `Scheduled` or directly as `Live`.
//!   Entering live keeps whatever the store already holds, so a restart in
//!   the middle of a match does not wipe its totals.
//! - Only an observed `Scheduled -> Live` transition resets the market.
//! - A live market stays live while discovery keeps reporting it.
//! - A market missing from discovery is finished and evicted. Its rows stay
//!   in the store. Whitelisted markets are never evicted.
//!
//! Selection labels are assigned once per selection id, in the order ids
//! are first parsed, and cached for as long as the market is tracked.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::config::LifecycleConfig;
use crate::domain::{
    DiscoveredMarket, MarketId, MarketPhase, MarketSnapshot, SelectionId, TeamLabels,
};
use crate::port::outbound::store::CumulativeStore;

/// Registry entry for one tracked market.
#[derive(Debug, Clone)]
pub struct TrackedMarket {
    pub display_name: String,
    pub labels: TeamLabels,
    /// Label per selection id, fixed at the id's first parse.
    pub selection_labels: HashMap<SelectionId, String>,
    pub phase: MarketPhase,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub last_polled_at: Option<DateTime<Utc>>,
    /// Went live but the store reset has not succeeded yet.
    pub pending_reset: bool,
    /// Whitelisted: always live, never evicted.
    pub pinned: bool,
}

impl TrackedMarket {
    fn new(market: &DiscoveredMarket, phase: MarketPhase, now: DateTime<Utc>) -> Self {
        Self {
            display_name: market.display_name.clone(),
            labels: TeamLabels::from_display_name(&market.display_name),
            selection_labels: HashMap::new(),
            phase,
            scheduled_start: market.scheduled_start,
            first_seen_at: now,
            last_seen_at: now,
            last_polled_at: None,
            pending_reset: false,
            pinned: false,
        }
    }
}

/// Phase changes produced by one discovery reconcile.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LifecycleChanges {
    pub entered: Vec<(MarketId, MarketPhase)>,
    pub went_live: Vec<MarketId>,
    pub finished: Vec<MarketId>,
}

impl LifecycleChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.went_live.is_empty() && self.finished.is_empty()
    }
}

/// Owner of the market registry.
pub struct LifecycleManager {
    config: LifecycleConfig,
    discovery_interval: Duration,
    last_discovery_at: Option<DateTime<Utc>>,
    registry: BTreeMap<MarketId, TrackedMarket>,
}

impl LifecycleManager {
    /// Create a manager with whitelisted markets already tracked as live.
    pub fn new(config: LifecycleConfig, discovery_interval: Duration, now: DateTime<Utc>) -> Self {
        let mut registry = BTreeMap::new();
        for entry in &config.whitelist {
            let market = DiscoveredMarket::new(entry.market_id.clone(), entry.name.clone());
            let mut tracked = TrackedMarket::new(&market, MarketPhase::Live, now);
            tracked.pinned = true;
            registry.insert(entry.market_id.clone(), tracked);
        }

        Self {
            config,
            discovery_interval,
            last_discovery_at: None,
            registry,
        }
    }

    /// Whether the discovery feed should be queried at `now`.
    #[must_use]
    pub fn discovery_due(&self, now: DateTime<Utc>) -> bool {
        self.last_discovery_at
            .map_or(true, |last| now - last >= self.discovery_interval)
    }

    /// Fold a successful discovery response into the registry.
    pub fn reconcile(
        &mut self,
        discovered: &[DiscoveredMarket],
        now: DateTime<Utc>,
    ) -> LifecycleChanges {
        self.last_discovery_at = Some(now);
        let mut changes = LifecycleChanges::default();
        let mut present = HashSet::with_capacity(discovered.len());

        for market in discovered {
            present.insert(market.market_id.clone());
            let reported = market.reported_phase(now, self.config.time_fallback);

            match self.registry.get_mut(&market.market_id) {
                Some(tracked) => {
                    tracked.last_seen_at = now;
                    if market.scheduled_start.is_some() {
                        tracked.scheduled_start = market.scheduled_start;
                    }
                    if tracked.pinned {
                        continue;
                    }
                    if tracked.phase == MarketPhase::Scheduled && reported == MarketPhase::Live {
                        tracked.phase = MarketPhase::Live;
                        tracked.pending_reset = true;
                        changes.went_live.push(market.market_id.clone());
                    }
                }
                None => {
                    self.registry.insert(
                        market.market_id.clone(),
                        TrackedMarket::new(market, reported, now),
                    );
                    changes.entered.push((market.market_id.clone(), reported));
                }
            }
        }

        let finished: Vec<MarketId> = self
            .registry
            .iter()
            .filter(|(id, tracked)| !tracked.pinned && !present.contains(*id))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &finished {
            self.registry.remove(id);
        }
        changes.finished = finished;

        for (id, phase) in &changes.entered {
            info!(market_id = %id, phase = %phase, "Market entered tracking");
        }
        for id in &changes.went_live {
            info!(market_id = %id, "Market went live");
        }
        for id in &changes.finished {
            info!(market_id = %id, phase = %MarketPhase::Finished, "Market finished");
        }

        changes
    }

    /// Apply the time-based go-live fallback between discovery refreshes.
    ///
    /// Returns the markets that went live.
    pub fn advance_clock(&mut self, now: DateTime<Utc>) -> Vec<MarketId> {
        if !self.config.time_fallback {
            return Vec::new();
        }

        let mut went_live = Vec::new();
        for (id, tracked) in &mut self.registry {
            if tracked.phase == MarketPhase::Scheduled
                && tracked.scheduled_start.is_some_and(|start| start <= now)
            {
                tracked.phase = MarketPhase::Live;
                tracked.pending_reset = true;
                info!(market_id = %id, "Market went live by scheduled start");
                went_live.push(id.clone());
            }
        }
        went_live
    }

    /// Markets that went live and still need their totals cleared.
    #[must_use]
    pub fn pending_resets(&self) -> Vec<MarketId> {
        self.registry
            .iter()
            .filter(|(_, tracked)| tracked.pending_reset)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Record that a market's reset went through.
    pub fn confirm_reset(&mut self, market_id: &MarketId) {
        if let Some(tracked) = self.registry.get_mut(market_id) {
            tracked.pending_reset = false;
        }
    }

    /// Clear the stored totals of every market that just went live.
    ///
    /// A failed reset is retried on the next call; until then the market
    /// stays out of [`active_markets`](Self::active_markets).
    pub async fn perform_resets<S: CumulativeStore>(&mut self, store: &S) -> usize {
        let mut done = 0;
        for market_id in self.pending_resets() {
            match store.reset(&market_id).await {
                Ok(removed) => {
                    info!(market_id = %market_id, removed, "Cleared pre-live totals");
                    self.confirm_reset(&market_id);
                    done += 1;
                }
                Err(e) => {
                    warn!(market_id = %market_id, error = %e, "Reset failed, will retry");
                }
            }
        }
        done
    }

    /// Markets to poll on the next tick.
    #[must_use]
    pub fn active_markets(&self) -> Vec<MarketId> {
        self.registry
            .iter()
            .filter(|(_, tracked)| match tracked.phase {
                MarketPhase::Live => !tracked.pending_reset,
                MarketPhase::Scheduled => self.config.track_scheduled,
                MarketPhase::Unseen | MarketPhase::Finished => false,
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn mark_polled(&mut self, market_id: &MarketId, now: DateTime<Utc>) {
        if let Some(tracked) = self.registry.get_mut(market_id) {
            tracked.last_polled_at = Some(now);
        }
    }

    #[must_use]
    pub fn get(&self, market_id: &MarketId) -> Option<&TrackedMarket> {
        self.registry.get(market_id)
    }

    /// Current phase; absent markets are unseen.
    #[must_use]
    pub fn phase(&self, market_id: &MarketId) -> MarketPhase {
        self.registry
            .get(market_id)
            .map_or(MarketPhase::Unseen, |tracked| tracked.phase)
    }

    #[must_use]
    pub fn labels(&self, market_id: &MarketId) -> Option<&TeamLabels> {
        self.registry.get(market_id).map(|tracked| &tracked.labels)
    }

    /// Labels for the selections of `snapshot`.
    ///
    /// An id seen for the first time takes the next free label slot, so the
    /// first parse maps ladder order onto the title's teams. Ids already
    /// cached keep their label whatever their position in later ladders.
    /// Untracked markets get no labels.
    pub fn resolve_labels(&mut self, snapshot: &MarketSnapshot) -> HashMap<SelectionId, String> {
        let Some(tracked) = self.registry.get_mut(snapshot.market_id()) else {
            return HashMap::new();
        };
        for ladder in snapshot.selections() {
            if !tracked.selection_labels.contains_key(ladder.selection_id()) {
                let label = tracked.labels.label_for(tracked.selection_labels.len());
                tracked
                    .selection_labels
                    .insert(ladder.selection_id().clone(), label);
            }
        }
        snapshot
            .selections()
            .iter()
            .filter_map(|ladder| {
                let id = ladder.selection_id();
                tracked
                    .selection_labels
                    .get(id)
                    .map(|label| (id.clone(), label.clone()))
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Count of tracked markets per phase, as `(scheduled, live)`.
    #[must_use]
    pub fn phase_counts(&self) -> (usize, usize) {
        self.registry
            .values()
            .fold((0, 0), |(scheduled, live), tracked| match tracked.phase {
                MarketPhase::Scheduled => (scheduled + 1, live),
                MarketPhase::Live => (scheduled, live + 1),
                _ => (scheduled, live),
            })
    }
}
