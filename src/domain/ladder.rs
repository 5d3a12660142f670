//! Liquidity ladders and per-tick market snapshots.
//!
//! - [`PriceLevel`] - One `(price, size)` rung of available liquidity
//! - [`SelectionLadder`] - Back and lay ladders for one selection, best price first
//! - [`MarketSnapshot`] - Every selection ladder of a market at one poll tick
//!
//! Snapshots are ephemeral: built fresh each tick and never persisted verbatim.

use serde::Serialize;

use super::error::DomainError;
use super::id::{MarketId, SelectionId};

/// A single price level with the stake available at that price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceLevel {
    price: f64,
    size: f64,
}

impl PriceLevel {
    /// Create a price level, validating that both values are finite and non-negative.
    pub fn try_new(price: f64, size: f64) -> Result<Self, DomainError> {
        if !price.is_finite() || price < 0.0 {
            return Err(DomainError::InvalidPrice { price });
        }
        if !size.is_finite() || size < 0.0 {
            return Err(DomainError::InvalidSize { size });
        }
        Ok(Self { price, size })
    }

    #[must_use]
    pub const fn price(&self) -> f64 {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> f64 {
        self.size
    }
}

/// Back and lay liquidity for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionLadder {
    selection_id: SelectionId,
    back: Vec<PriceLevel>,
    lay: Vec<PriceLevel>,
}

impl SelectionLadder {
    pub fn new(selection_id: SelectionId, back: Vec<PriceLevel>, lay: Vec<PriceLevel>) -> Self {
        Self {
            selection_id,
            back,
            lay,
        }
    }

    #[must_use]
    pub const fn selection_id(&self) -> &SelectionId {
        &self.selection_id
    }

    #[must_use]
    pub fn back(&self) -> &[PriceLevel] {
        &self.back
    }

    #[must_use]
    pub fn lay(&self) -> &[PriceLevel] {
        &self.lay
    }

    /// Aggregate back stake: sum of sizes over every back level.
    #[must_use]
    pub fn back_stake(&self) -> f64 {
        self.back.iter().map(PriceLevel::size).sum()
    }

    /// Aggregate lay stake: sum of sizes over every lay level.
    #[must_use]
    pub fn lay_stake(&self) -> f64 {
        self.lay.iter().map(PriceLevel::size).sum()
    }

    #[must_use]
    pub fn best_back(&self) -> Option<&PriceLevel> {
        self.back.first()
    }

    #[must_use]
    pub fn best_lay(&self) -> Option<&PriceLevel> {
        self.lay.first()
    }
}

/// All selection ladders for a market at a single poll tick.
///
/// Always holds at least one selection; an empty parse is not a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    market_id: MarketId,
    total_matched: Option<f64>,
    selections: Vec<SelectionLadder>,
}

impl MarketSnapshot {
    /// Create a snapshot, rejecting an empty selection list.
    pub fn try_new(
        market_id: MarketId,
        total_matched: Option<f64>,
        selections: Vec<SelectionLadder>,
    ) -> Result<Self, DomainError> {
        if selections.is_empty() {
            return Err(DomainError::EmptySnapshot {
                market_id: market_id.to_string(),
            });
        }
        Ok(Self {
            market_id,
            total_matched,
            selections,
        })
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub const fn total_matched(&self) -> Option<f64> {
        self.total_matched
    }

    #[must_use]
    pub fn selections(&self) -> &[SelectionLadder] {
        &self.selections
    }
}
