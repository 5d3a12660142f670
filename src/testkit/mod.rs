//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`feed`] - Scripted [`DiscoveryFeed`](crate::port::outbound::feed::DiscoveryFeed)
//!   and [`MarketDataFeed`](crate::port::outbound::feed::MarketDataFeed) doubles.
//! - [`domain`] - Builders for wire strings and discovered markets.

pub mod domain;
pub mod feed;
