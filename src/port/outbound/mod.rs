//! Outbound ports (driven side): interfaces implemented by outbound adapters.

pub mod feed;
pub mod store;

pub use feed::{DiscoveryFeed, MarketDataFeed};
pub use store::CumulativeStore;
