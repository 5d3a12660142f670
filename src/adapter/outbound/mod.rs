//! Outbound adapters (driven side).

pub mod exchange;
pub mod memory;
pub mod sqlite;
pub mod wire;
