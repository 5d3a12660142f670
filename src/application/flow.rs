//! Flow classification over successive snapshots.
//!
//! For every selection of a snapshot, the engine reads the stored state,
//! folds the current aggregate stakes into it and writes it back. Writers
//! to the same `(market, selection)` key are serialised through a per-key
//! async mutex so a later write always sees the earlier one's baseline.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{MarketId, MarketSnapshot, SelectionId, SelectionKey, SelectionState};
use crate::error::PersistenceError;
use crate::port::outbound::store::CumulativeStore;

/// Applies snapshots to the cumulative store.
pub struct FlowEngine<S> {
    store: Arc<S>,
    locks: DashMap<SelectionKey, Arc<Mutex<()>>>,
    large_move_threshold: f64,
}

impl<S: CumulativeStore> FlowEngine<S> {
    pub fn new(store: Arc<S>, large_move_threshold: f64) -> Self {
        Self {
            store,
            locks: DashMap::new(),
            large_move_threshold,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fold one snapshot into the store.
    ///
    /// `labels` maps selection ids to display names and is only consulted
    /// when a selection is first seen; a stored label is never rewritten. A
    /// selection without an entry is labelled by its position. Returns the
    /// states as written.
    ///
    /// # Errors
    /// Stops at the first store failure. Selections already written keep
    /// their update; the rest are retried from stored state next tick.
    pub async fn apply(
        &self,
        snapshot: &MarketSnapshot,
        labels: &HashMap<SelectionId, String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<SelectionState>, PersistenceError> {
        let mut updated = Vec::with_capacity(snapshot.selections().len());

        for (index, ladder) in snapshot.selections().iter().enumerate() {
            let key = SelectionKey::new(
                snapshot.market_id().clone(),
                ladder.selection_id().clone(),
            );
            let label = labels
                .get(ladder.selection_id())
                .cloned()
                .unwrap_or_else(|| format!("Selection {}", index + 1));

            let state = self
                .apply_selection(key, label, ladder.back_stake(), ladder.lay_stake(), now)
                .await?;
            updated.push(state);
        }

        Ok(updated)
    }

    async fn apply_selection(
        &self,
        key: SelectionKey,
        label: String,
        back_stake: f64,
        lay_stake: f64,
        now: DateTime<Utc>,
    ) -> Result<SelectionState, PersistenceError> {
        let lock = Arc::clone(&self.locks.entry(key.clone()).or_default());
        let _guard = lock.lock().await;

        let state = match self.store.get(&key).await? {
            None => {
                let state = SelectionState::first_sighting(key, label, back_stake, lay_stake, now);
                info!(
                    market_id = %state.key().market_id,
                    selection_id = %state.key().selection_id,
                    team = state.team_label(),
                    back = back_stake,
                    lay = lay_stake,
                    "New selection baselined"
                );
                state
            }
            Some(mut state) => {
                let delta = state.observe(back_stake, lay_stake, now);
                if delta.is_zero() {
                    debug!(key = %state.key(), "Selection unchanged");
                } else if delta.magnitude() > self.large_move_threshold {
                    info!(
                        market_id = %state.key().market_id,
                        selection_id = %state.key().selection_id,
                        team = state.team_label(),
                        delta_back = delta.back,
                        delta_lay = delta.lay,
                        net_back = state.net_back(),
                        net_lay = state.net_lay(),
                        "Large flow move"
                    );
                } else {
                    debug!(
                        key = %state.key(),
                        delta_back = delta.back,
                        delta_lay = delta.lay,
                        "Selection flow updated"
                    );
                }
                state
            }
        };

        self.store.upsert(&state).await?;
        Ok(state)
    }

    /// Drop the lock entries of a market that is no longer polled.
    pub fn forget_market(&self, market_id: &MarketId) {
        self.locks.retain(|key, _| &key.market_id != market_id);
    }
}
