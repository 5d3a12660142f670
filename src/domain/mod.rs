//! Exchange-agnostic domain logic.

pub mod error;
pub mod id;
pub mod ladder;
pub mod market;
pub mod selection;

pub use error::DomainError;
pub use id::{MarketId, SelectionId, SelectionKey};
pub use ladder::{MarketSnapshot, PriceLevel, SelectionLadder};
pub use market::{DiscoveredMarket, MarketPhase, TeamLabels};
pub use selection::{FlowDelta, SelectionState, Side, SideFlow};
