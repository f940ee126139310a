//! Fluent construction of search queries.

use crate::query::filter::{FilterOperator, FilterValue, SearchFilter};
use crate::query::query::{PaginationOptions, SearchQuery};
use crate::query::sort::{SortDirection, SortMode, SortOption};

/// A fluent builder for [`SearchQuery`].
///
/// Pure data assembly: no validation, no I/O. Structural problems (unknown
/// fields, incompatible operators, bad pagination) are reported at
/// execution so the builder stays composable. `build()` clones the current
/// state and never mutates previously returned queries.
#[derive(Debug, Clone, Default)]
pub struct SearchQueryBuilder {
    query: SearchQuery,
}

impl SearchQueryBuilder {
    /// Create a new builder with default state.
    pub fn new() -> Self {
        SearchQueryBuilder {
            query: SearchQuery::default(),
        }
    }

    /// Set the free-text query.
    pub fn query<S: Into<String>>(mut self, text: S) -> Self {
        self.query.query = Some(text.into());
        self
    }

    /// Add a field condition to the top-level conjunction.
    pub fn filter<S: Into<String>>(
        mut self,
        field: S,
        operator: FilterOperator,
        value: FilterValue,
    ) -> Self {
        self.query
            .filters
            .push(SearchFilter::condition(field, operator, value));
        self
    }

    /// Add a pre-built filter (for OR/NOT sub-groups).
    pub fn filter_group(mut self, filter: SearchFilter) -> Self {
        self.query.filters.push(filter);
        self
    }

    /// Request a facet for a field. Adding the same field twice keeps it
    /// once.
    pub fn facet<S: Into<String>>(mut self, field: S) -> Self {
        let field = field.into();
        if !self.query.facets.contains(&field) {
            self.query.facets.push(field);
        }
        self
    }

    /// Append a sort key.
    pub fn sort<S: Into<String>>(mut self, field: S, direction: SortDirection) -> Self {
        self.query.sort.push(SortOption::new(field, direction));
        self
    }

    /// Append a sort key with a collapse mode for array-valued fields.
    pub fn sort_with_mode<S: Into<String>>(
        mut self,
        field: S,
        direction: SortDirection,
        mode: SortMode,
    ) -> Self {
        self.query
            .sort
            .push(SortOption::with_mode(field, direction, mode));
        self
    }

    /// Set the pagination window.
    pub fn pagination(mut self, page: usize, limit: usize) -> Self {
        self.query.pagination = PaginationOptions::new(page, limit);
        self
    }

    /// Enable or disable highlighting.
    pub fn highlight(mut self, highlight: bool) -> Self {
        self.query.highlight = highlight;
        self
    }

    /// Enable or disable fuzzy text matching.
    pub fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.query.fuzzy = fuzzy;
        self
    }

    /// Set a per-field relevance weight.
    pub fn boost<S: Into<String>>(mut self, field: S, weight: f32) -> Self {
        self.query.boost.insert(field.into(), weight);
        self
    }

    /// Build the final query.
    pub fn build(&self) -> SearchQuery {
        self.query.clone()
    }
}
