//! Snapshot parser for the positional wire format.

use crate::domain::{MarketId, MarketSnapshot, PriceLevel, SelectionId, SelectionLadder};
use crate::error::ParseError;

use super::layout::{SelectionIdPolicy, WireLayout};

/// Turns one raw wire string into a [`MarketSnapshot`].
///
/// Parsing is pure: the same input always yields an equal snapshot.
#[derive(Debug, Clone, Default)]
pub struct WireParser {
    layout: WireLayout,
}

impl WireParser {
    #[must_use]
    pub fn new(layout: WireLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub const fn layout(&self) -> &WireLayout {
        &self.layout
    }

    /// Parse a raw market string.
    ///
    /// A malformed pair ends that selection's ladder early instead of
    /// failing the snapshot. A string without any recognised selection is
    /// an error, never an empty snapshot.
    ///
    /// # Errors
    /// Returns [`ParseError`] for an empty payload, a missing market id, or
    /// when no marker token is found.
    pub fn parse(&self, raw: &str) -> Result<MarketSnapshot, ParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ParseError::EmptyPayload);
        }

        let tokens: Vec<&str> = raw.split(self.layout.delimiter).collect();
        let market_id = MarketId::try_new(tokens[0]).map_err(|_| ParseError::MissingMarketId)?;
        let total_matched = tokens
            .get(self.layout.total_matched_index)
            .and_then(|token| parse_amount(token));

        let max_pairs = self.layout.max_pairs();
        let mut selections = Vec::new();
        let mut i = 1;

        while i < tokens.len() {
            if tokens[i] != self.layout.marker {
                i += 1;
                continue;
            }

            let selection_id = self.selection_id(tokens[i - 1], selections.len());
            i += 1;

            let mut levels = Vec::with_capacity(max_pairs);
            while levels.len() < max_pairs && i + 1 < tokens.len() {
                // The token before a marker names the next selection.
                if self.closes_ladder(&tokens, i) {
                    break;
                }
                match parse_level(tokens[i], tokens[i + 1]) {
                    Some(level) => {
                        levels.push(level);
                        i += 2;
                    }
                    None => break,
                }
            }

            let lay = levels.split_off(self.layout.back_levels.min(levels.len()));
            selections.push(SelectionLadder::new(selection_id, levels, lay));
        }

        MarketSnapshot::try_new(market_id.clone(), total_matched, selections).map_err(|_| {
            ParseError::NoSelections {
                market_id: market_id.to_string(),
            }
        })
    }

    fn closes_ladder(&self, tokens: &[&str], i: usize) -> bool {
        tokens[i..]
            .iter()
            .take(3)
            .any(|token| *token == self.layout.marker)
    }

    fn selection_id(&self, preceding: &str, position: usize) -> SelectionId {
        match self.layout.selection_ids {
            SelectionIdPolicy::Vendor if is_vendor_id(preceding) => SelectionId::new(preceding),
            _ => SelectionId::positional(position),
        }
    }
}

fn is_vendor_id(token: &str) -> bool {
    !token.is_empty() && token.parse::<u64>().is_ok()
}

fn parse_amount(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

fn parse_level(price: &str, size: &str) -> Option<PriceLevel> {
    let price = price.trim().parse::<f64>().ok()?;
    let size = size.trim().parse::<f64>().ok()?;
    PriceLevel::try_new(price, size).ok()
}
