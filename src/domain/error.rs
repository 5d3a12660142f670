//! Domain validation errors for core domain types.
//!
//! These errors are returned by `try_new` constructors that validate
//! inputs, and by conversions that rebuild domain records from storage.
//!
//! # Examples
//!
//! ```
//! use stakeflow::domain::error::DomainError;
//! use stakeflow::domain::ladder::PriceLevel;
//!
//! let result = PriceLevel::try_new(1.5, -10.0);
//! assert!(matches!(result, Err(DomainError::InvalidSize { .. })));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Identifiers must carry at least one non-whitespace character.
    #[error("{kind} cannot be empty")]
    EmptyId {
        /// Which identifier was empty.
        kind: &'static str,
    },

    /// Prices must be finite and non-negative.
    #[error("price must be finite and non-negative, got {price}")]
    InvalidPrice {
        /// The rejected price.
        price: f64,
    },

    /// Sizes must be finite and non-negative.
    #[error("size must be finite and non-negative, got {size}")]
    InvalidSize {
        /// The rejected size.
        size: f64,
    },

    /// Running flow totals must be finite and non-negative.
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidTotal {
        /// The offending column.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A snapshot must contain at least one selection.
    #[error("snapshot for {market_id} has no selections")]
    EmptySnapshot {
        /// The market the snapshot was built for.
        market_id: String,
    },
}
