//! End-to-end scenarios for the faceted search engine.

use std::sync::Arc;

use tamis::document::{Document, FieldValue};
use tamis::error::SearchError;
use tamis::query::{FilterOperator, FilterValue, SearchFilter, SearchQueryBuilder, SortDirection};
use tamis::schema::{FieldType, IndexField, SearchIndex};
use tamis::search::{MemoryStore, SearchEngine};

fn users_index() -> SearchIndex {
    SearchIndex::builder("users")
        .field(
            IndexField::new("name", FieldType::Text)
                .searchable(true)
                .boost(2.0),
        )
        .field(IndexField::new("bio", FieldType::Text).searchable(true))
        .field(
            IndexField::new("role", FieldType::Keyword)
                .filterable(true)
                .facetable(true),
        )
        .field(
            IndexField::new("age", FieldType::Integer)
                .filterable(true)
                .sortable(true),
        )
        .field(
            IndexField::new("joined", FieldType::Date)
                .filterable(true)
                .facetable(true),
        )
        .build()
        .unwrap()
}

fn seeded_engine() -> (SearchEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = SearchEngine::new(store.clone());
    engine.create_index(users_index());

    let people: &[(&str, &str, i64, &str)] = &[
        ("ada", "learner", 36, "2024-01-15T00:00:00Z"),
        ("bob", "teacher", 51, "2024-01-20T00:00:00Z"),
        ("cid", "learner", 24, "2024-02-03T00:00:00Z"),
        ("dot", "learner", 58, "2024-02-11T00:00:00Z"),
        ("eve", "admin", 44, "2024-03-01T00:00:00Z"),
        ("fay", "learner", 17, "2024-03-09T00:00:00Z"),
    ];
    for (i, (name, role, age, joined)) in people.iter().enumerate() {
        store.upsert(
            "users",
            Document::builder(format!("u{i}"))
                .text("name", *name)
                .text("bio", format!("{name} writes about search"))
                .text("role", *role)
                .integer("age", *age)
                .date("joined", joined.parse().unwrap())
                .build(),
        );
    }
    (engine, store)
}

fn age_of(doc: &Document) -> i64 {
    match doc.get_field("age").unwrap() {
        FieldValue::Integer(age) => *age,
        other => panic!("expected integer age, got {other:?}"),
    }
}

#[test]
fn filter_facet_sort_paginate_scenario() {
    let (engine, _) = seeded_engine();

    let query = SearchQueryBuilder::new()
        .filter("role", FilterOperator::Equals, FilterValue::text("learner"))
        .filter(
            "age",
            FilterOperator::Between,
            FilterValue::numbers([18.0, 60.0]),
        )
        .facet("role")
        .sort("age", SortDirection::Descending)
        .pagination(1, 10)
        .build();

    let result = engine.search("users", &query).unwrap();

    // ada (36), cid (24), dot (58) qualify; fay is 17
    assert_eq!(result.total, 3);
    assert!(result.items.len() <= 10);
    let ages: Vec<i64> = result.items.iter().map(age_of).collect();
    assert_eq!(ages, vec![58, 36, 24]);
    for doc in &result.items {
        assert_eq!(doc.get_field("role").unwrap().as_text(), Some("learner"));
    }

    // One bucket for the single surviving role, total equal to its count
    let role_facet = result.facets.iter().find(|f| f.field == "role").unwrap();
    assert_eq!(role_facet.buckets.len(), 1);
    assert_eq!(role_facet.buckets[0].key, "learner");
    assert_eq!(role_facet.buckets[0].count, 3);
    assert!(role_facet.buckets[0].selected);
    assert_eq!(role_facet.total, 3);

    // Pagination invariants
    assert_eq!(result.total_pages, 1);
    assert!(!result.has_next);
    assert!(!result.has_prev);
}

#[test]
fn type_mismatch_names_the_field() {
    let (engine, _) = seeded_engine();

    let query = SearchQueryBuilder::new()
        .filter("age", FilterOperator::GreaterThan, FilterValue::text("abc"))
        .build();

    match engine.search("users", &query) {
        Err(SearchError::Config { field, .. }) => assert_eq!(field, "age"),
        other => panic!("Expected config error, got {other:?}"),
    }
}

#[test]
fn non_facetable_facet_is_omitted_not_fatal() {
    let (engine, _) = seeded_engine();

    let query = SearchQueryBuilder::new()
        .facet("age")
        .facet("role")
        .build();

    let result = engine.search("users", &query).unwrap();
    assert_eq!(result.total, 6);
    let facet_fields: Vec<&str> = result.facets.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(facet_fields, vec!["role"]);
}

#[test]
fn between_reversed_bounds_rejected() {
    let (engine, _) = seeded_engine();

    let query = SearchQueryBuilder::new()
        .filter(
            "age",
            FilterOperator::Between,
            FilterValue::numbers([60.0, 18.0]),
        )
        .build();

    match engine.search("users", &query) {
        Err(SearchError::Config { field, reason }) => {
            assert_eq!(field, "age");
            assert!(reason.contains("invalid range"));
        }
        other => panic!("Expected config error, got {other:?}"),
    }
}

#[test]
fn facet_counts_cover_all_matches_not_the_page() {
    let (engine, _) = seeded_engine();

    let query = SearchQueryBuilder::new()
        .facet("role")
        .pagination(1, 2)
        .build();

    let result = engine.search("users", &query).unwrap();
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.total, 6);

    let role_facet = result.facets.iter().find(|f| f.field == "role").unwrap();
    // Counts reflect all six users: learner 4, admin 1, teacher 1
    assert_eq!(role_facet.total, 6);
    assert_eq!(role_facet.buckets[0].key, "learner");
    assert_eq!(role_facet.buckets[0].count, 4);
    // Ties (admin/teacher at 1) order by key ascending
    assert_eq!(role_facet.buckets[1].key, "admin");
    assert_eq!(role_facet.buckets[2].key, "teacher");
}

#[test]
fn pagination_windows_are_consistent() {
    let (engine, _) = seeded_engine();

    let mut seen = Vec::new();
    for page in 1..=3 {
        let query = SearchQueryBuilder::new()
            .sort("age", SortDirection::Ascending)
            .pagination(page, 2)
            .build();
        let result = engine.search("users", &query).unwrap();

        assert_eq!(result.total, 6);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.has_prev, page > 1);
        assert_eq!(result.has_next, page < 3);
        seen.extend(result.items.iter().map(age_of));
    }

    // Sorted order holds across page boundaries with no gaps or repeats
    assert_eq!(seen, vec![17, 24, 36, 44, 51, 58]);

    // A page past the end is empty but keeps the math
    let query = SearchQueryBuilder::new().pagination(9, 2).build();
    let result = engine.search("users", &query).unwrap();
    assert!(result.items.is_empty());
    assert_eq!(result.total_pages, 3);
    assert!(!result.has_next);
    assert!(result.has_prev);
}

#[test]
fn nested_or_group_composes_with_top_level_and() {
    let (engine, _) = seeded_engine();

    // (role == teacher OR role == admin) AND age >= 45
    let query = SearchQueryBuilder::new()
        .filter_group(SearchFilter::any(vec![
            SearchFilter::condition("role", FilterOperator::Equals, FilterValue::text("teacher")),
            SearchFilter::condition("role", FilterOperator::Equals, FilterValue::text("admin")),
        ]))
        .filter(
            "age",
            FilterOperator::GreaterThanOrEqual,
            FilterValue::Number(45.0),
        )
        .build();

    let result = engine.search("users", &query).unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].get_field("name").unwrap().as_text(), Some("bob"));
}

#[test]
fn text_query_with_highlighting_and_fuzz() {
    let (engine, _) = seeded_engine();

    let query = SearchQueryBuilder::new()
        .query("serch")
        .fuzzy(true)
        .highlight(true)
        .build();

    let result = engine.search("users", &query).unwrap();
    // Every bio mentions search
    assert_eq!(result.total, 6);
    assert!(!result.highlights.is_empty());
    let any_highlight = result.highlights.values().next().unwrap();
    assert_eq!(any_highlight[0].field, "bio");
    assert!(any_highlight[0].fragments[0].contains("<mark>search</mark>"));
}

#[test]
fn date_histogram_buckets_by_month() {
    let (engine, _) = seeded_engine();

    let query = SearchQueryBuilder::new().facet("joined").build();
    let result = engine.search("users", &query).unwrap();

    let joined = result.facets.iter().find(|f| f.field == "joined").unwrap();
    let keys: Vec<&str> = joined.buckets.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);
    let counts: Vec<u64> = joined.buckets.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![2, 2, 2]);
    assert_eq!(joined.total, 6);
}

#[test]
fn suggestions_come_from_history() {
    let (engine, _) = seeded_engine();

    // Seed history with a popular term
    for _ in 0..3 {
        let query = SearchQueryBuilder::new().query("search basics").build();
        engine.search("users", &query).unwrap();
    }

    let query = SearchQueryBuilder::new().query("serch").build();
    let result = engine.search("users", &query).unwrap();
    assert!(result.suggestions.contains(&"search".to_string()));

    // Popularity ranking saw every recorded query
    let popular = engine.popular_searches(5);
    assert_eq!(popular[0].term, "search");
}

#[test]
fn empty_in_filter_matches_nothing() {
    let (engine, _) = seeded_engine();

    let query = SearchQueryBuilder::new()
        .filter("role", FilterOperator::In, FilterValue::List(vec![]))
        .build();
    let result = engine.search("users", &query).unwrap();
    assert_eq!(result.total, 0);
    assert_eq!(result.total_pages, 0);

    let query = SearchQueryBuilder::new()
        .filter("role", FilterOperator::NotIn, FilterValue::List(vec![]))
        .build();
    let result = engine.search("users", &query).unwrap();
    assert_eq!(result.total, 6);
}

#[test]
fn store_mutations_visible_to_searches() {
    let (engine, store) = seeded_engine();

    store.upsert(
        "users",
        Document::builder("u9")
            .text("name", "gil")
            .text("role", "learner")
            .integer("age", 30)
            .build(),
    );

    let query = SearchQueryBuilder::new()
        .filter("role", FilterOperator::Equals, FilterValue::text("learner"))
        .build();
    assert_eq!(engine.search("users", &query).unwrap().total, 5);

    store.remove("users", "u9");
    assert_eq!(engine.search("users", &query).unwrap().total, 4);
}
