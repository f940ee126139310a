//! Sort options for search results.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// How a multi-valued field collapses to a single sort key.
///
/// Only meaningful for array-valued fields; `Sum`, `Avg`, and `Median`
/// additionally require numeric elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Smallest element.
    Min,
    /// Largest element.
    Max,
    /// Sum of numeric elements.
    Sum,
    /// Mean of numeric elements.
    Avg,
    /// Median of numeric elements.
    Median,
}

impl SortMode {
    /// Whether this mode needs numeric elements.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, SortMode::Sum | SortMode::Avg | SortMode::Median)
    }
}

/// One key of a multi-key sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOption {
    /// The field to sort by.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
    /// Collapse mode for array-valued fields.
    pub mode: Option<SortMode>,
}

impl SortOption {
    /// Create a sort option without a mode.
    pub fn new<S: Into<String>>(field: S, direction: SortDirection) -> Self {
        SortOption {
            field: field.into(),
            direction,
            mode: None,
        }
    }

    /// Create a sort option with a collapse mode for array fields.
    pub fn with_mode<S: Into<String>>(field: S, direction: SortDirection, mode: SortMode) -> Self {
        SortOption {
            field: field.into(),
            direction,
            mode: Some(mode),
        }
    }
}
