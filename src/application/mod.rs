//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate the feed and
//! store ports: the flow engine folds snapshots into cumulative totals, the
//! lifecycle manager decides what is tracked, and the scheduler drives both.

pub mod config;
pub mod flow;
pub mod lifecycle;
pub mod report;
pub mod scheduler;

pub use config::{LifecycleConfig, PollConfig, WhitelistEntry};
pub use flow::FlowEngine;
pub use lifecycle::{LifecycleChanges, LifecycleManager, TrackedMarket};
pub use report::{market_flow, FlowTotals, MarketFlowSummary, SelectionFlowView};
pub use scheduler::{PollScheduler, SchedulerSettings, TickReport};
