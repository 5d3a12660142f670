//! SQLite persistence adapter.
//!
//! Provides the durable [`CumulativeStore`](crate::port::outbound::store::CumulativeStore)
//! implementation using Diesel ORM over an r2d2 pool.

pub mod database;
pub mod store;

pub use database::connection::{create_pool, run_migrations, DbPool};
pub use store::SqliteCumulativeStore;
