//! Wire DTOs for the event list endpoint.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{DiscoveredMarket, MarketId};

#[derive(Debug, Deserialize)]
pub(super) struct EventListResponse {
    #[serde(default)]
    pub data: Option<EventListData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EventListData {
    #[serde(default)]
    pub events: Vec<EventDto>,
}

/// One event as listed upstream. Field types vary between deployments, so
/// loosely typed fields are normalised in [`EventDto::into_domain`].
#[derive(Debug, Deserialize)]
pub(super) struct EventDto {
    #[serde(default)]
    pub market_id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub in_play: Option<Value>,
    #[serde(default, alias = "start_time", alias = "market_start_time")]
    pub open_date: Option<String>,
}

impl EventDto {
    /// Convert to a domain record. Events without a string market id are
    /// dropped.
    ///
    /// A numeric id is rejected: JSON numbers lose trailing zeros, so
    /// `1.250` would come back as `"1.25"` and name a different market.
    pub fn into_domain(self) -> Option<DiscoveredMarket> {
        let market_id = match self.market_id? {
            Value::String(s) => s,
            Value::Number(n) => {
                debug!(market_id = %n, "Dropping event with numeric market id");
                return None;
            }
            _ => return None,
        };
        let market_id = MarketId::try_new(market_id).ok()?;
        let display_name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or(self.event_name)
            .unwrap_or_default();

        Some(DiscoveredMarket {
            market_id,
            display_name,
            in_play: self.in_play.as_ref().and_then(flag),
            scheduled_start: self.open_date.as_deref().and_then(parse_start),
        })
    }
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim() {
            "1" | "true" | "TRUE" | "True" => Some(true),
            "0" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse an ISO-8601 start time, assuming UTC when no offset is given.
pub(super) fn parse_start(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
