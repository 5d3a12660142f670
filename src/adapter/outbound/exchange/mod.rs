//! HTTP exchange feeds.
//!
//! Discovery reads the guest event list once per configured sport; market
//! data is a single form POST carrying every requested `market_ids[]` and
//! answering with a JSON array of raw wire strings.

mod client;
mod dto;
mod settings;

pub use client::HttpFeed;
pub use settings::FeedConfig;
