//! Stakeflow - cumulative back/lay flow tracking for betting-exchange markets.
//!
//! The tracker polls an upstream feed for live markets, parses each raw
//! ladder string into a snapshot, and folds the change in aggregate stake
//! into durable per-selection totals: inflow when stake grows, outflow when
//! it shrinks. Net flow is always derived, never stored.
//!
//! # Architecture
//!
//! - [`domain`] - Exchange-agnostic types: ids, ladders, snapshots, flow state
//! - [`port`] - Traits for the upstream feeds and the cumulative store
//! - [`adapter`] - HTTP feeds, wire parser, SQLite and in-memory stores, CLI
//! - [`application`] - Flow engine, market lifecycle, poll scheduler, reports
//! - [`infrastructure`] - Configuration, logging, wiring and entrypoints
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use stakeflow::adapter::outbound::wire::WireParser;
//!
//! let snapshot = WireParser::default()
//!     .parse("1.001|x|x|x|x|500|1|ACTIVE|1.5|100|1.55|50|1.6|25|2.0|80|2.05|40|2.1|20")
//!     .unwrap();
//! assert_eq!(snapshot.selections()[0].back_stake(), 175.0);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
