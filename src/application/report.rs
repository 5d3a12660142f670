//! Read surface over the cumulative store.
//!
//! Builds per-market views with net values derived from in and out, for
//! whatever presentation layer consumes them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{MarketId, SelectionId, SelectionState};
use crate::error::PersistenceError;
use crate::port::outbound::store::CumulativeStore;

/// One selection's cumulative flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionFlowView {
    pub selection_id: SelectionId,
    pub team_label: String,
    pub in_back: f64,
    pub out_back: f64,
    pub net_back: f64,
    pub in_lay: f64,
    pub out_lay: f64,
    pub net_lay: f64,
    pub last_back_stake: f64,
    pub last_lay_stake: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<&SelectionState> for SelectionFlowView {
    fn from(state: &SelectionState) -> Self {
        Self {
            selection_id: state.key().selection_id.clone(),
            team_label: state.team_label().to_string(),
            in_back: state.in_back(),
            out_back: state.out_back(),
            net_back: state.net_back(),
            in_lay: state.in_lay(),
            out_lay: state.out_lay(),
            net_lay: state.net_lay(),
            last_back_stake: state.last_back_stake(),
            last_lay_stake: state.last_lay_stake(),
            updated_at: state.updated_at(),
        }
    }
}

/// Sums across every selection of a market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FlowTotals {
    pub in_back: f64,
    pub out_back: f64,
    pub net_back: f64,
    pub in_lay: f64,
    pub out_lay: f64,
    pub net_lay: f64,
}

impl FlowTotals {
    fn add(&mut self, view: &SelectionFlowView) {
        self.in_back += view.in_back;
        self.out_back += view.out_back;
        self.net_back += view.net_back;
        self.in_lay += view.in_lay;
        self.out_lay += view.out_lay;
        self.net_lay += view.net_lay;
    }
}

/// Cumulative flow of one market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketFlowSummary {
    pub market_id: MarketId,
    pub selections: Vec<SelectionFlowView>,
    pub totals: FlowTotals,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MarketFlowSummary {
    #[must_use]
    pub fn from_states(market_id: MarketId, states: &[SelectionState]) -> Self {
        let selections: Vec<SelectionFlowView> =
            states.iter().map(SelectionFlowView::from).collect();
        let mut totals = FlowTotals::default();
        for view in &selections {
            totals.add(view);
        }
        let updated_at = selections.iter().map(|v| v.updated_at).max();

        Self {
            market_id,
            selections,
            totals,
            updated_at,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

/// Load the cumulative view of a market.
///
/// # Errors
/// Returns the store error if the rows cannot be read.
pub async fn market_flow<S: CumulativeStore>(
    store: &S,
    market_id: &MarketId,
) -> Result<MarketFlowSummary, PersistenceError> {
    let states = store.list_by_market(market_id).await?;
    Ok(MarketFlowSummary::from_states(market_id.clone(), &states))
}
