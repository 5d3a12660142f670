//! In-memory cumulative store for tests and ephemeral runs.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::domain::{MarketId, SelectionKey, SelectionState};
use crate::error::PersistenceError;
use crate::port::outbound::store::CumulativeStore;

/// Volatile store keyed like the SQLite table. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCumulativeStore {
    rows: RwLock<BTreeMap<SelectionKey, SelectionState>>,
}

impl MemoryCumulativeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all markets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl CumulativeStore for MemoryCumulativeStore {
    async fn get(&self, key: &SelectionKey) -> Result<Option<SelectionState>, PersistenceError> {
        Ok(self.rows.read().get(key).cloned())
    }

    async fn upsert(&self, state: &SelectionState) -> Result<(), PersistenceError> {
        self.rows.write().insert(state.key().clone(), state.clone());
        Ok(())
    }

    async fn reset(&self, market_id: &MarketId) -> Result<usize, PersistenceError> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|key, _| &key.market_id != market_id);
        Ok(before - rows.len())
    }

    async fn list_by_market(
        &self,
        market_id: &MarketId,
    ) -> Result<Vec<SelectionState>, PersistenceError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|(key, _)| &key.market_id == market_id)
            .map(|(_, state)| state.clone())
            .collect())
    }
}
