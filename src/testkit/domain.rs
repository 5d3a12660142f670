//! Builders for domain primitives used across tests.
//!
//! [`WireBuilder`] produces strings in the default wire layout so tests
//! can state stakes instead of hand-writing pipe-delimited payloads.

use chrono::{DateTime, Utc};

use crate::domain::{DiscoveredMarket, MarketId};

/// Create a [`MarketId`] from a string.
pub fn market_id(id: &str) -> MarketId {
    MarketId::from(id)
}

/// A discovered market with the in-play flag set.
pub fn live_market(id: &str, name: &str) -> DiscoveredMarket {
    DiscoveredMarket::new(market_id(id), name).with_in_play(true)
}

/// A discovered market that starts at `start` and is not yet in play.
pub fn scheduled_market(id: &str, name: &str, start: DateTime<Utc>) -> DiscoveredMarket {
    DiscoveredMarket::new(market_id(id), name)
        .with_in_play(false)
        .with_scheduled_start(start)
}

const BACK_LEVELS: usize = 3;

struct WireSelection {
    id: String,
    back: Vec<f64>,
    lay: Vec<f64>,
}

/// Builds one raw market string in the default layout.
///
/// Prices are generated per level; only sizes matter to the flow engine.
/// Short back ladders are padded with empty levels so the lay ladder
/// starts where the parser expects it.
pub struct WireBuilder {
    market_id: String,
    total_matched: f64,
    selections: Vec<WireSelection>,
}

impl WireBuilder {
    pub fn new(market_id: &str) -> Self {
        Self {
            market_id: market_id.to_string(),
            total_matched: 0.0,
            selections: Vec::new(),
        }
    }

    #[must_use]
    pub fn total_matched(mut self, total: f64) -> Self {
        self.total_matched = total;
        self
    }

    /// Add a selection with the given back and lay sizes, best level first.
    #[must_use]
    pub fn selection(mut self, id: &str, back: &[f64], lay: &[f64]) -> Self {
        self.selections.push(WireSelection {
            id: id.to_string(),
            back: back.to_vec(),
            lay: lay.to_vec(),
        });
        self
    }

    pub fn build(&self) -> String {
        let mut tokens = vec![
            self.market_id.clone(),
            "x".into(),
            "x".into(),
            "x".into(),
            "x".into(),
            format!("{}", self.total_matched),
        ];
        for selection in &self.selections {
            tokens.push(selection.id.clone());
            tokens.push("ACTIVE".into());
            let mut back = selection.back.clone();
            back.resize(back.len().max(BACK_LEVELS), 0.0);
            push_levels(&mut tokens, &back, 1.50);
            push_levels(&mut tokens, &selection.lay, 2.00);
        }
        tokens.join("|")
    }
}

fn push_levels(tokens: &mut Vec<String>, sizes: &[f64], base: f64) {
    for (i, size) in sizes.iter().enumerate() {
        tokens.push(format!("{:.2}", base + i as f64 * 0.05));
        tokens.push(format!("{size}"));
    }
}
