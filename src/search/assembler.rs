//! Result assembly: sorting, pagination, and the final result envelope.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue};
use crate::error::{Result, SearchError};
use crate::facet::FacetResult;
use crate::query::query::{PaginationOptions, SearchQuery};
use crate::query::sort::{SortDirection, SortMode, SortOption};
use crate::schema::index::SearchIndex;
use crate::search::highlight::HighlightResult;
use crate::search::store::ScoredDocument;

/// A page of search results with everything around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult<T> {
    /// The items on this page. At most `limit` entries.
    pub items: Vec<T>,
    /// Total matches before pagination.
    pub total: u64,
    /// The requested page, 1-based.
    pub page: usize,
    /// The requested page size.
    pub limit: usize,
    /// Number of pages: `ceil(total / limit)`.
    pub total_pages: usize,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
    /// Facets over the full filtered result set.
    pub facets: Vec<FacetResult>,
    /// Highlights keyed by document id.
    pub highlights: HashMap<String, Vec<HighlightResult>>,
    /// Alternate query suggestions; empty is always valid.
    pub suggestions: Vec<String>,
    /// Wall-clock execution time in milliseconds.
    pub search_time_ms: u64,
    /// The query that produced this result.
    pub query: SearchQuery,
}

impl<T> SearchResult<T> {
    /// Map the item type, keeping everything else.
    pub fn try_map<U, F>(self, f: F) -> Result<SearchResult<U>>
    where
        F: Fn(T) -> Result<U>,
    {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<U>>>()?;
        Ok(SearchResult {
            items,
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
            facets: self.facets,
            highlights: self.highlights,
            suggestions: self.suggestions,
            search_time_ms: self.search_time_ms,
            query: self.query,
        })
    }
}

/// Sorts, paginates, and packages matches into a [`SearchResult`].
#[derive(Debug, Default)]
pub struct ResultAssembler;

impl ResultAssembler {
    /// Create a new assembler.
    pub fn new() -> Self {
        ResultAssembler
    }

    /// Reject out-of-range pagination before anything executes.
    pub fn validate_pagination(&self, pagination: &PaginationOptions) -> Result<()> {
        if pagination.page < 1 {
            return Err(SearchError::config("page", "page must be at least 1"));
        }
        if pagination.limit < 1 {
            return Err(SearchError::config("limit", "limit must be at least 1"));
        }
        Ok(())
    }

    /// Validate sort options against the index: the field must exist, be
    /// sortable, and a numeric collapse mode needs a numeric field.
    pub fn validate_sort(&self, sort: &[SortOption], index: &SearchIndex) -> Result<()> {
        for option in sort {
            let field = index.require_field(&option.field)?;
            if !field.sortable {
                return Err(SearchError::config(&field.name, "field is not sortable"));
            }
            if let Some(mode) = option.mode
                && mode.requires_numeric()
                && !field.field_type.is_numeric()
            {
                return Err(SearchError::config(
                    &field.name,
                    format!(
                        "sort mode {mode:?} requires a numeric field, not {}",
                        field.field_type
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Stable multi-key sort. With no sort options, matches order by score
    /// descending when a text query drove them (ties by id ascending);
    /// pure filter matches keep store order.
    pub fn sort(&self, matches: &mut [ScoredDocument], sort: &[SortOption], scored_by_text: bool) {
        if sort.is_empty() {
            if scored_by_text {
                matches.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.doc.id().cmp(b.doc.id()))
                });
            }
            return;
        }

        matches.sort_by(|a, b| {
            for option in sort {
                let ordering = compare_by_option(&a.doc, &b.doc, option);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Slice out the requested page. Applied strictly after filtering and
    /// sorting.
    pub fn paginate(
        &self,
        matches: Vec<ScoredDocument>,
        pagination: &PaginationOptions,
    ) -> Vec<ScoredDocument> {
        matches
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit)
            .collect()
    }

    /// Package everything into the final envelope.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        &self,
        items: Vec<Document>,
        total: u64,
        query: &SearchQuery,
        facets: Vec<FacetResult>,
        highlights: HashMap<String, Vec<HighlightResult>>,
        suggestions: Vec<String>,
        search_time_ms: u64,
    ) -> SearchResult<Document> {
        let PaginationOptions { page, limit } = query.pagination;
        let total_pages = (total as usize).div_ceil(limit);

        SearchResult {
            items,
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
            facets,
            highlights,
            suggestions,
            search_time_ms,
            query: query.clone(),
        }
    }
}

/// Compare two documents by one sort option. Missing or incomparable
/// values sort last regardless of direction.
fn compare_by_option(a: &Document, b: &Document, option: &SortOption) -> Ordering {
    let key_a = sort_key(a, option);
    let key_b = sort_key(b, option);

    match (key_a, key_b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = a.compare(&b).unwrap_or(Ordering::Equal);
            match option.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

/// The value a document sorts by for one option, collapsing array fields
/// through the option's mode (`Min` when unspecified).
fn sort_key(doc: &Document, option: &SortOption) -> Option<FieldValue> {
    let value = doc.get_field(&option.field)?;
    match value {
        FieldValue::Null => None,
        FieldValue::Array(elements) => {
            collapse_array(elements, option.mode.unwrap_or(SortMode::Min))
        }
        other => Some(other.clone()),
    }
}

fn collapse_array(elements: &[FieldValue], mode: SortMode) -> Option<FieldValue> {
    if elements.is_empty() {
        return None;
    }
    match mode {
        SortMode::Min => elements
            .iter()
            .cloned()
            .min_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal)),
        SortMode::Max => elements
            .iter()
            .cloned()
            .max_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal)),
        SortMode::Sum | SortMode::Avg | SortMode::Median => {
            let mut numbers: Vec<f64> = elements.iter().filter_map(|v| v.as_f64()).collect();
            if numbers.is_empty() {
                return None;
            }
            let value = match mode {
                SortMode::Sum => numbers.iter().sum(),
                SortMode::Avg => numbers.iter().sum::<f64>() / numbers.len() as f64,
                _ => {
                    numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
                    let mid = numbers.len() / 2;
                    if numbers.len() % 2 == 0 {
                        (numbers[mid - 1] + numbers[mid]) / 2.0
                    } else {
                        numbers[mid]
                    }
                }
            };
            Some(FieldValue::Float(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::field::{FieldType, IndexField};

    fn scored(doc: Document) -> ScoredDocument {
        ScoredDocument { doc, score: 1.0 }
    }

    fn people() -> Vec<ScoredDocument> {
        vec![
            scored(
                Document::builder("p1")
                    .text("name", "ada")
                    .integer("age", 36)
                    .build(),
            ),
            scored(
                Document::builder("p2")
                    .text("name", "bob")
                    .integer("age", 29)
                    .build(),
            ),
            scored(
                Document::builder("p3")
                    .text("name", "cid")
                    .integer("age", 36)
                    .build(),
            ),
            scored(Document::builder("p4").text("name", "dot").build()),
        ]
    }

    fn ids(matches: &[ScoredDocument]) -> Vec<&str> {
        matches.iter().map(|m| m.doc.id()).collect()
    }

    #[test]
    fn test_pagination_validation() {
        let assembler = ResultAssembler::new();
        assert!(assembler.validate_pagination(&PaginationOptions::new(1, 1)).is_ok());

        match assembler.validate_pagination(&PaginationOptions::new(0, 10)) {
            Err(SearchError::Config { field, .. }) => assert_eq!(field, "page"),
            other => panic!("Expected config error, got {other:?}"),
        }
        match assembler.validate_pagination(&PaginationOptions::new(1, 0)) {
            Err(SearchError::Config { field, .. }) => assert_eq!(field, "limit"),
            other => panic!("Expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_sort_validation() {
        let index = SearchIndex::builder("people")
            .field(IndexField::new("age", FieldType::Integer).sortable(true))
            .field(IndexField::new("name", FieldType::Text))
            .field(IndexField::new("tags", FieldType::Keyword).sortable(true))
            .build()
            .unwrap();
        let assembler = ResultAssembler::new();

        assert!(
            assembler
                .validate_sort(&[SortOption::new("age", SortDirection::Ascending)], &index)
                .is_ok()
        );

        // Not sortable
        assert!(
            assembler
                .validate_sort(&[SortOption::new("name", SortDirection::Ascending)], &index)
                .is_err()
        );

        // Unknown field
        assert!(
            assembler
                .validate_sort(&[SortOption::new("ghost", SortDirection::Ascending)], &index)
                .is_err()
        );

        // Numeric mode on a keyword field
        let result = assembler.validate_sort(
            &[SortOption::with_mode(
                "tags",
                SortDirection::Ascending,
                SortMode::Sum,
            )],
            &index,
        );
        match result {
            Err(SearchError::Config { field, .. }) => assert_eq!(field, "tags"),
            other => panic!("Expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_key_sort_with_missing_last() {
        let assembler = ResultAssembler::new();
        let mut matches = people();

        assembler.sort(
            &mut matches,
            &[
                SortOption::new("age", SortDirection::Descending),
                SortOption::new("name", SortDirection::Ascending),
            ],
            false,
        );

        // p4 has no age and sorts last even descending; the age tie between
        // p1 and p3 breaks on name ascending.
        assert_eq!(ids(&matches), vec!["p1", "p3", "p2", "p4"]);
    }

    #[test]
    fn test_relevance_default_sort() {
        let assembler = ResultAssembler::new();
        let mut matches = people();
        matches[1].score = 9.0; // p2
        matches[2].score = 4.0; // p3

        assembler.sort(&mut matches, &[], true);
        assert_eq!(ids(&matches)[..2], ["p2", "p3"]);

        // Without a text query the store order is preserved
        let mut matches = people();
        assembler.sort(&mut matches, &[], false);
        assert_eq!(ids(&matches), vec!["p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn test_array_sort_modes() {
        let assembler = ResultAssembler::new();
        let mut matches = vec![
            scored(
                Document::builder("a")
                    .array(
                        "scores",
                        vec![FieldValue::Integer(1), FieldValue::Integer(9)],
                    )
                    .build(),
            ),
            scored(
                Document::builder("b")
                    .array(
                        "scores",
                        vec![FieldValue::Integer(4), FieldValue::Integer(5)],
                    )
                    .build(),
            ),
        ];

        // Max: a (9) over b (5)
        assembler.sort(
            &mut matches,
            &[SortOption::with_mode(
                "scores",
                SortDirection::Descending,
                SortMode::Max,
            )],
            false,
        );
        assert_eq!(ids(&matches), vec!["a", "b"]);

        // Avg: b (4.5) under a (5.0) ascending
        assembler.sort(
            &mut matches,
            &[SortOption::with_mode(
                "scores",
                SortDirection::Ascending,
                SortMode::Avg,
            )],
            false,
        );
        assert_eq!(ids(&matches), vec!["b", "a"]);
    }

    #[test]
    fn test_median_collapse() {
        assert_eq!(
            collapse_array(
                &[
                    FieldValue::Integer(1),
                    FieldValue::Integer(10),
                    FieldValue::Integer(3)
                ],
                SortMode::Median
            ),
            Some(FieldValue::Float(3.0))
        );
        assert_eq!(
            collapse_array(
                &[FieldValue::Integer(1), FieldValue::Integer(3)],
                SortMode::Median
            ),
            Some(FieldValue::Float(2.0))
        );
    }

    #[test]
    fn test_pagination_slicing() {
        let assembler = ResultAssembler::new();
        let page = assembler.paginate(people(), &PaginationOptions::new(2, 3));
        assert_eq!(ids(&page), vec!["p4"]);

        let page = assembler.paginate(people(), &PaginationOptions::new(5, 3));
        assert!(page.is_empty());
    }

    #[test]
    fn test_assemble_invariants() {
        let assembler = ResultAssembler::new();
        let query = SearchQuery {
            pagination: PaginationOptions::new(2, 10),
            ..Default::default()
        };

        let result = assembler.assemble(
            vec![],
            25,
            &query,
            vec![],
            HashMap::new(),
            vec![],
            3,
        );

        assert_eq!(result.total_pages, 3);
        assert!(result.has_next);
        assert!(result.has_prev);

        // Exact multiple
        let query = SearchQuery {
            pagination: PaginationOptions::new(3, 5),
            ..Default::default()
        };
        let result = assembler.assemble(vec![], 15, &query, vec![], HashMap::new(), vec![], 0);
        assert_eq!(result.total_pages, 3);
        assert!(!result.has_next);
        assert!(result.has_prev);

        // Empty result set
        let query = SearchQuery::default();
        let result = assembler.assemble(vec![], 0, &query, vec![], HashMap::new(), vec![], 0);
        assert_eq!(result.total_pages, 0);
        assert!(!result.has_next);
        assert!(!result.has_prev);
    }

    #[test]
    fn test_pagination_invariants_grid() {
        let assembler = ResultAssembler::new();
        for total in [0u64, 1, 9, 10, 11, 57] {
            for limit in [1usize, 3, 10] {
                for page in 1..=8 {
                    let query = SearchQuery {
                        pagination: PaginationOptions::new(page, limit),
                        ..Default::default()
                    };
                    let result =
                        assembler.assemble(vec![], total, &query, vec![], HashMap::new(), vec![], 0);

                    let expected_pages = (total as usize + limit - 1) / limit;
                    assert_eq!(result.total_pages, expected_pages);
                    assert_eq!(result.has_next, page < expected_pages);
                    assert_eq!(result.has_prev, page > 1);
                }
            }
        }
    }

    #[test]
    fn test_try_map() {
        let assembler = ResultAssembler::new();
        let query = SearchQuery::default();
        let result = assembler.assemble(
            vec![Document::builder("x").integer("n", 7).build()],
            1,
            &query,
            vec![],
            HashMap::new(),
            vec![],
            0,
        );

        let mapped = result
            .try_map(|doc| Ok(doc.id().to_string()))
            .unwrap();
        assert_eq!(mapped.items, vec!["x"]);
        assert_eq!(mapped.total, 1);
    }
}
