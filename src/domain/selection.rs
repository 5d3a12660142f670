//! Durable cumulative flow state per `(market, selection)`.
//!
//! Each side (back, lay) keeps a running inflow, a running outflow and the
//! last observed aggregate stake. Net flow is always derived as
//! `inflow - outflow` and is never stored on its own.

use chrono::{DateTime, Utc};

use super::error::DomainError;
use super::id::SelectionKey;

/// Ladder side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Back,
    Lay,
}

impl Side {
    const fn columns(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Back => ("in_back", "out_back", "last_back_stake"),
            Self::Lay => ("in_lay", "out_lay", "last_lay_stake"),
        }
    }
}

/// Running totals for one side of a selection's ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideFlow {
    inflow: f64,
    outflow: f64,
    last_stake: f64,
}

impl SideFlow {
    /// Baseline a side on first sighting: the observed stake counts as inflow once.
    #[must_use]
    pub fn baseline(stake: f64) -> Self {
        Self {
            inflow: stake,
            outflow: 0.0,
            last_stake: stake,
        }
    }

    /// Rebuild a side from persisted totals.
    pub fn restore(
        inflow: f64,
        outflow: f64,
        last_stake: f64,
        side: Side,
    ) -> Result<Self, DomainError> {
        let check = |field: &'static str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(value)
            } else {
                Err(DomainError::InvalidTotal { field, value })
            }
        };
        let (in_field, out_field, last_field) = side.columns();
        Ok(Self {
            inflow: check(in_field, inflow)?,
            outflow: check(out_field, outflow)?,
            last_stake: check(last_field, last_stake)?,
        })
    }

    /// Fold a newly observed aggregate stake into the totals.
    ///
    /// Returns the signed delta against the previous baseline. The baseline
    /// always moves to `stake`, whatever the sign of the delta.
    pub fn observe(&mut self, stake: f64) -> f64 {
        let delta = stake - self.last_stake;
        if delta > 0.0 {
            self.inflow += delta;
        } else if delta < 0.0 {
            self.outflow += -delta;
        }
        self.last_stake = stake;
        delta
    }

    #[must_use]
    pub const fn inflow(&self) -> f64 {
        self.inflow
    }

    #[must_use]
    pub const fn outflow(&self) -> f64 {
        self.outflow
    }

    #[must_use]
    pub fn net(&self) -> f64 {
        self.inflow - self.outflow
    }

    #[must_use]
    pub const fn last_stake(&self) -> f64 {
        self.last_stake
    }
}

/// Signed stake changes produced by one observation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowDelta {
    pub back: f64,
    pub lay: f64,
}

impl FlowDelta {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.back == 0.0 && self.lay == 0.0
    }

    /// Largest absolute move on either side.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.back.abs().max(self.lay.abs())
    }
}

/// Cumulative flow record for one selection of one market.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    key: SelectionKey,
    team_label: String,
    back: SideFlow,
    lay: SideFlow,
    updated_at: DateTime<Utc>,
}

impl SelectionState {
    /// Create the record for a selection seen for the first time.
    ///
    /// In-flow totals are baselined to the observed stakes so pre-existing
    /// liquidity is counted exactly once.
    pub fn first_sighting(
        key: SelectionKey,
        team_label: impl Into<String>,
        back_stake: f64,
        lay_stake: f64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            team_label: team_label.into(),
            back: SideFlow::baseline(back_stake),
            lay: SideFlow::baseline(lay_stake),
            updated_at: at,
        }
    }

    /// Rebuild a record from its persisted parts.
    pub fn restore(
        key: SelectionKey,
        team_label: impl Into<String>,
        back: SideFlow,
        lay: SideFlow,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            team_label: team_label.into(),
            back,
            lay,
            updated_at,
        }
    }

    /// Fold the current aggregate stakes into the running totals.
    pub fn observe(&mut self, back_stake: f64, lay_stake: f64, at: DateTime<Utc>) -> FlowDelta {
        let back = self.back.observe(back_stake);
        let lay = self.lay.observe(lay_stake);
        self.updated_at = at;
        FlowDelta { back, lay }
    }

    #[must_use]
    pub const fn key(&self) -> &SelectionKey {
        &self.key
    }

    #[must_use]
    pub fn team_label(&self) -> &str {
        &self.team_label
    }

    #[must_use]
    pub const fn back(&self) -> &SideFlow {
        &self.back
    }

    #[must_use]
    pub const fn lay(&self) -> &SideFlow {
        &self.lay
    }

    #[must_use]
    pub const fn in_back(&self) -> f64 {
        self.back.inflow()
    }

    #[must_use]
    pub const fn out_back(&self) -> f64 {
        self.back.outflow()
    }

    #[must_use]
    pub const fn in_lay(&self) -> f64 {
        self.lay.inflow()
    }

    #[must_use]
    pub const fn out_lay(&self) -> f64 {
        self.lay.outflow()
    }

    #[must_use]
    pub fn net_back(&self) -> f64 {
        self.back.net()
    }

    #[must_use]
    pub fn net_lay(&self) -> f64 {
        self.lay.net()
    }

    #[must_use]
    pub const fn last_back_stake(&self) -> f64 {
        self.back.last_stake()
    }

    #[must_use]
    pub const fn last_lay_stake(&self) -> f64 {
        self.lay.last_stake()
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
