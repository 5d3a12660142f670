//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! Adapters implement them to reach the upstream exchange feeds and the
//! durable cumulative store.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                                                       ▼
//! ┌──────────────┐                                     ┌─────────────┐
//! │ Feed Adapter │                                     │    Store    │
//! │ (discovery,  │                                     │   Adapter   │
//! │ market data) │                                     │  (sqlite)   │
//! └──────────────┘                                     └─────────────┘
//! ```

pub mod outbound;
