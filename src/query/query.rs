//! The immutable search query model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::query::filter::SearchFilter;
use crate::query::sort::SortOption;

/// Pagination window, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationOptions {
    /// Page number, starting at 1.
    pub page: usize,
    /// Items per page, at least 1.
    pub limit: usize,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        PaginationOptions { page: 1, limit: 10 }
    }
}

impl PaginationOptions {
    /// Create pagination options.
    pub fn new(page: usize, limit: usize) -> Self {
        PaginationOptions { page, limit }
    }

    /// The number of items skipped before this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1)) * self.limit
    }
}

/// The immutable unit of search work.
///
/// Built once per request through [`SearchQueryBuilder`], consumed by one
/// execution, never mutated by the engine. Structural validation (field
/// existence, capability flags, pagination bounds) happens at execution
/// time, not at construction.
///
/// [`SearchQueryBuilder`]: crate::query::builder::SearchQueryBuilder
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Optional free-text query.
    pub query: Option<String>,
    /// Ordered filters, combined as a conjunction at the top level.
    pub filters: Vec<SearchFilter>,
    /// Fields to facet on, deduplicated in insertion order.
    pub facets: Vec<String>,
    /// Ordered sort keys.
    pub sort: Vec<SortOption>,
    /// Pagination window.
    pub pagination: PaginationOptions,
    /// Whether to highlight text matches.
    pub highlight: bool,
    /// Whether free-text matching tolerates small edit distances.
    pub fuzzy: bool,
    /// Per-field relevance weights, merged over the index's field boosts.
    pub boost: BTreeMap<String, f32>,
}

impl SearchQuery {
    /// The free-text query, if present and non-blank.
    pub fn text(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}
