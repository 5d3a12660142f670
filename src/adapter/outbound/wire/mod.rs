//! Positional wire format of the market data feed.
//!
//! A raw market string is a flat list of tokens split on a single
//! delimiter. Token 0 is the market id, a fixed head position carries the
//! matched total, and every occurrence of the marker token opens one
//! selection's ladder of `(price, size)` pairs.

mod layout;
mod parser;

pub use layout::{SelectionIdPolicy, WireLayout};
pub use parser::WireParser;
