//! Market discovery and lifecycle domain types.
//!
//! - [`DiscoveredMarket`] - One market as reported by the discovery feed
//! - [`MarketPhase`] - Lifecycle phase of a tracked market
//! - [`TeamLabels`] - Display labels derived once from the event title

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::MarketId;

/// One entry of the discovery feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredMarket {
    pub market_id: MarketId,
    pub display_name: String,
    /// Upstream in-play flag, `None` when the feed did not report one.
    pub in_play: Option<bool>,
    pub scheduled_start: Option<DateTime<Utc>>,
}

impl DiscoveredMarket {
    pub fn new(market_id: MarketId, display_name: impl Into<String>) -> Self {
        Self {
            market_id,
            display_name: display_name.into(),
            in_play: None,
            scheduled_start: None,
        }
    }

    #[must_use]
    pub fn with_in_play(mut self, in_play: bool) -> Self {
        self.in_play = Some(in_play);
        self
    }

    #[must_use]
    pub fn with_scheduled_start(mut self, start: DateTime<Utc>) -> Self {
        self.scheduled_start = Some(start);
        self
    }

    /// Phase implied by this report at `now`.
    ///
    /// The in-play flag wins when set. With `time_fallback`, a market whose
    /// scheduled start has passed is treated as live even without the flag,
    /// since upstream flags lag behind reality.
    #[must_use]
    pub fn reported_phase(&self, now: DateTime<Utc>, time_fallback: bool) -> MarketPhase {
        if self.in_play == Some(true) {
            return MarketPhase::Live;
        }
        if time_fallback && self.scheduled_start.is_some_and(|start| start <= now) {
            return MarketPhase::Live;
        }
        MarketPhase::Scheduled
    }
}

/// Lifecycle phase of a market under tracking.
///
/// `Unseen` and `Finished` are never stored: a market absent from the
/// registry is unseen, and a finished market is evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketPhase {
    Unseen,
    Scheduled,
    Live,
    Finished,
}

impl std::fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unseen => write!(f, "unseen"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Live => write!(f, "live"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

const SEPARATORS: [&str; 5] = [" v ", " vs ", " VS ", " Vs ", " V "];
const DRAW_LABEL: &str = "Draw";

/// Display labels for the selections of a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamLabels {
    home: String,
    away: String,
}

impl TeamLabels {
    /// Split an event title such as `"India v Australia"` into two labels.
    ///
    /// Without a recognised separator, the whole title is the first label
    /// and the second is empty.
    #[must_use]
    pub fn from_display_name(name: &str) -> Self {
        for sep in SEPARATORS {
            if let Some((home, away)) = name.split_once(sep) {
                let home = home.trim();
                let away = away.trim();
                if !home.is_empty() && !away.is_empty() {
                    return Self {
                        home: home.to_string(),
                        away: away.to_string(),
                    };
                }
            }
        }
        Self {
            home: name.trim().to_string(),
            away: String::new(),
        }
    }

    #[must_use]
    pub fn home(&self) -> &str {
        &self.home
    }

    #[must_use]
    pub fn away(&self) -> &str {
        &self.away
    }

    /// Label for the selection at ladder position `index` (0-based).
    ///
    /// The third selection of a two-label market is the draw. Anything
    /// without a derived label falls back to `Selection N`, so the result
    /// is never empty.
    #[must_use]
    pub fn label_for(&self, index: usize) -> String {
        let derived = match index {
            0 => self.home.as_str(),
            1 => self.away.as_str(),
            2 if !self.home.is_empty() && !self.away.is_empty() => DRAW_LABEL,
            _ => "",
        };
        if derived.is_empty() {
            format!("Selection {}", index + 1)
        } else {
            derived.to_string()
        }
    }
}
