//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Market identifier, e.g. `1.252151159` (`<major>.<minor>`).
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(String);

impl MarketId {
    /// Create a new `MarketId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a `MarketId`, rejecting blank input.
    pub fn try_new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyId { kind: "market id" });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the market ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MarketId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Selection identifier within a market.
///
/// Either the vendor's numeric runner id or a 1-based positional index,
/// depending on the configured selection-id policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectionId(String);

impl SelectionId {
    /// Create a new `SelectionId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthesize a 1-based positional id from a ladder index.
    #[must_use]
    pub fn positional(index: usize) -> Self {
        Self((index + 1).to_string())
    }

    /// Get the selection ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SelectionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SelectionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Composite key of a cumulative row: one selection in one market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectionKey {
    pub market_id: MarketId,
    pub selection_id: SelectionId,
}

impl SelectionKey {
    pub fn new(market_id: MarketId, selection_id: SelectionId) -> Self {
        Self {
            market_id,
            selection_id,
        }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.market_id, self.selection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_id_try_new_trims_whitespace() {
        let id = MarketId::try_new("  1.252151159 ").unwrap();
        assert_eq!(id.as_str(), "1.252151159");
    }

    #[test]
    fn market_id_try_new_rejects_blank() {
        assert!(matches!(
            MarketId::try_new("   "),
            Err(DomainError::EmptyId { kind: "market id" })
        ));
    }

    #[test]
    fn positional_selection_ids_are_one_based() {
        assert_eq!(SelectionId::positional(0).as_str(), "1");
        assert_eq!(SelectionId::positional(2).as_str(), "3");
    }

    #[test]
    fn selection_key_display() {
        let key = SelectionKey::new(MarketId::from("1.001"), SelectionId::from("16606"));
        assert_eq!(key.to_string(), "1.001/16606");
    }
}
