//! SQLite database modules.
//!
//! Provides connection management, the schema definition and Diesel row
//! types for the cumulative table.

pub mod connection;
pub mod model;
pub mod schema;
