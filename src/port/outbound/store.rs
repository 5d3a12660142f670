//! Persistence port for cumulative selection flow.

use std::future::Future;

use crate::domain::{MarketId, SelectionKey, SelectionState};
use crate::error::PersistenceError;

/// Durable keyed store of [`SelectionState`] rows.
///
/// Upserts are last-write-wins per `(market_id, selection_id)`. Writes to
/// different keys must not block each other.
pub trait CumulativeStore: Send + Sync {
    /// Get the state for one selection.
    fn get(
        &self,
        key: &SelectionKey,
    ) -> impl Future<Output = Result<Option<SelectionState>, PersistenceError>> + Send;

    /// Insert or replace the state for its key.
    fn upsert(
        &self,
        state: &SelectionState,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Delete every row of a market. Returns the number of rows removed.
    fn reset(
        &self,
        market_id: &MarketId,
    ) -> impl Future<Output = Result<usize, PersistenceError>> + Send;

    /// List every row of a market, ordered by selection id.
    fn list_by_market(
        &self,
        market_id: &MarketId,
    ) -> impl Future<Output = Result<Vec<SelectionState>, PersistenceError>> + Send;
}
