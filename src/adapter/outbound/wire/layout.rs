//! Wire layout settings.
//!
//! Vendors have shipped different delimiters and back/lay splits; all of
//! that lives here so the scanning algorithm never changes.

use serde::Deserialize;

use crate::error::ConfigError;

/// How selection ids are assigned to parsed ladders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionIdPolicy {
    /// Use the numeric token preceding the marker, falling back to the
    /// 1-based ladder position when that token is not numeric.
    #[default]
    Vendor,
    /// Always use the 1-based ladder position.
    Positional,
}

/// Field layout of the positional wire format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WireLayout {
    /// Token delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Literal token that opens each selection's ladder.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Token position of the market's matched total.
    #[serde(default = "default_total_matched_index")]
    pub total_matched_index: usize,

    /// Number of leading `(price, size)` pairs that form the back ladder.
    #[serde(default = "default_levels")]
    pub back_levels: usize,

    /// Number of pairs after the back ladder that form the lay ladder.
    #[serde(default = "default_levels")]
    pub lay_levels: usize,

    /// Selection id assignment.
    #[serde(default)]
    pub selection_ids: SelectionIdPolicy,
}

const fn default_delimiter() -> char {
    '|'
}

fn default_marker() -> String {
    "ACTIVE".into()
}

const fn default_total_matched_index() -> usize {
    5
}

const fn default_levels() -> usize {
    3
}

impl Default for WireLayout {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            marker: default_marker(),
            total_matched_index: default_total_matched_index(),
            back_levels: default_levels(),
            lay_levels: default_levels(),
            selection_ids: SelectionIdPolicy::default(),
        }
    }
}

impl WireLayout {
    /// Maximum number of `(price, size)` pairs read after a marker.
    #[must_use]
    pub const fn max_pairs(&self) -> usize {
        self.back_levels + self.lay_levels
    }

    /// Validate the layout.
    ///
    /// # Errors
    /// Returns an error if the marker is blank, no levels are configured,
    /// or the marker contains the delimiter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "wire.marker",
            });
        }
        if self.marker.contains(self.delimiter) {
            return Err(ConfigError::InvalidValue {
                field: "wire.marker",
                reason: format!("must not contain the delimiter '{}'", self.delimiter),
            });
        }
        if self.max_pairs() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "wire.back_levels",
                reason: "back_levels + lay_levels must be greater than 0".into(),
            });
        }
        if self.total_matched_index == 0 {
            return Err(ConfigError::InvalidValue {
                field: "wire.total_matched_index",
                reason: "position 0 holds the market id".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_layout() {
        let layout = WireLayout::default();
        assert_eq!(layout.delimiter, '|');
        assert_eq!(layout.marker, "ACTIVE");
        assert_eq!(layout.total_matched_index, 5);
        assert_eq!(layout.max_pairs(), 6);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn deserializes_partial_table() {
        let layout: WireLayout = toml::from_str(
            r#"
delimiter = ";"
lay_levels = 2
selection_ids = "positional"
"#,
        )
        .unwrap();
        assert_eq!(layout.delimiter, ';');
        assert_eq!(layout.back_levels, 3);
        assert_eq!(layout.lay_levels, 2);
        assert_eq!(layout.selection_ids, SelectionIdPolicy::Positional);
    }

    #[test]
    fn rejects_zero_levels() {
        let layout = WireLayout {
            back_levels: 0,
            lay_levels: 0,
            ..WireLayout::default()
        };
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_marker_containing_delimiter() {
        let layout = WireLayout {
            marker: "AC|TIVE".into(),
            ..WireLayout::default()
        };
        assert!(layout.validate().is_err());
    }
}
