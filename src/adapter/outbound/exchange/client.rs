//! reqwest client implementing both upstream feeds.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, warn};

use super::dto::{EventDto, EventListResponse};
use super::settings::FeedConfig;
use crate::domain::{DiscoveredMarket, MarketId};
use crate::error::FetchError;
use crate::port::outbound::feed::{DiscoveryFeed, MarketDataFeed};

/// HTTP client for the event list and market data endpoints.
pub struct HttpFeed {
    http: HttpClient,
    events_url: String,
    market_data_url: String,
    sport_ids: Vec<u32>,
    timeout_ms: u64,
}

impl HttpFeed {
    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        let mut builder = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .default_headers(default_headers(config));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http = builder.build().unwrap_or_else(|err| {
            warn!(error = %err, "Failed to build HTTP client, using defaults");
            HttpClient::new()
        });

        Self {
            http,
            events_url: config.events_url.clone(),
            market_data_url: config.market_data_url.clone(),
            sport_ids: config.sport_ids.clone(),
            timeout_ms: config.timeout_ms,
        }
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                after_ms: self.timeout_ms,
            }
        } else {
            err.into()
        }
    }

    async fn fetch_events(&self, sport_id: Option<u32>) -> Result<Vec<EventDto>, FetchError> {
        let mut request = self.http.get(&self.events_url);
        if let Some(sport_id) = sport_id {
            request = request.query(&[("sport_id", sport_id)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify(e))?
            .error_for_status()
            .map_err(|e| self.classify(e))?;
        let body: EventListResponse = response.json().await.map_err(|e| self.classify(e))?;

        Ok(body.data.map(|d| d.events).unwrap_or_default())
    }
}

fn default_headers(config: &FeedConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid feed header"),
        }
    }
    if let Some(token) = &config.auth_token {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Feed token is not a valid header value, sending without it"),
        }
    }
    headers
}

#[async_trait]
impl DiscoveryFeed for HttpFeed {
    async fn discover(&self) -> Result<Vec<DiscoveredMarket>, FetchError> {
        let sports: Vec<Option<u32>> = if self.sport_ids.is_empty() {
            vec![None]
        } else {
            self.sport_ids.iter().copied().map(Some).collect()
        };

        let mut seen = HashSet::new();
        let mut markets = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0usize;

        for sport_id in sports {
            match self.fetch_events(sport_id).await {
                Ok(events) => {
                    succeeded += 1;
                    for market in events.into_iter().filter_map(EventDto::into_domain) {
                        if seen.insert(market.market_id.clone()) {
                            markets.push(market);
                        }
                    }
                }
                Err(err) => {
                    warn!(sport_id = ?sport_id, error = %err, "Event list request failed");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if succeeded == 0 => Err(err),
            _ => {
                debug!(count = markets.len(), "Discovered markets");
                Ok(markets)
            }
        }
    }

    fn name(&self) -> &'static str {
        "http-events"
    }
}

#[async_trait]
impl MarketDataFeed for HttpFeed {
    async fn fetch_raw(&self, market_ids: &[MarketId]) -> Result<Vec<String>, FetchError> {
        if market_ids.is_empty() {
            return Ok(Vec::new());
        }

        let form: Vec<(&str, &str)> = market_ids
            .iter()
            .map(|id| ("market_ids[]", id.as_str()))
            .collect();

        let response = self
            .http
            .post(&self.market_data_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.classify(e))?
            .error_for_status()
            .map_err(|e| self.classify(e))?;
        let body: Value = response.json().await.map_err(|e| self.classify(e))?;

        Ok(raw_strings(body))
    }

    fn name(&self) -> &'static str {
        "http-market-data"
    }
}

/// Keep only the string entries of a JSON array response.
fn raw_strings(body: Value) -> Vec<String> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
