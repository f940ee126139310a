//! Facet aggregation over the filtered, pre-pagination result set.
//!
//! Facets reflect all matches, not just the returned page; the engine runs
//! the aggregator before pagination. Fields that are unknown or not
//! facetable are skipped with a warning instead of failing the search.

use ahash::AHashMap;
use chrono::{Datelike, TimeZone, Utc};
use tracing::warn;

use crate::document::{Document, FieldValue};
use crate::facet::{FacetBucket, FacetResult, FacetType};
use crate::geo::GeoPoint;
use crate::query::filter::{FilterOperator, FilterValue, GeoQueryValue, SearchFilter};
use crate::schema::field::FieldType;
use crate::schema::index::SearchIndex;

/// Distance-ring bounds in kilometers for geo facets.
const GEO_RINGS: [(f64, Option<f64>); 4] =
    [(0.0, Some(10.0)), (10.0, Some(50.0)), (50.0, Some(200.0)), (200.0, None)];

/// Number of equal-width buckets for numeric range facets.
const RANGE_BUCKETS: usize = 5;

/// Configuration for facet aggregation.
#[derive(Debug, Clone)]
pub struct FacetAggregatorConfig {
    /// Maximum number of buckets returned per facet.
    pub max_buckets: usize,
}

impl Default for FacetAggregatorConfig {
    fn default() -> Self {
        FacetAggregatorConfig { max_buckets: 100 }
    }
}

/// Computes facet breakdowns for a result set.
#[derive(Debug, Default)]
pub struct FacetAggregator {
    config: FacetAggregatorConfig,
}

impl FacetAggregator {
    /// Create an aggregator with default configuration.
    pub fn new() -> Self {
        FacetAggregator {
            config: FacetAggregatorConfig::default(),
        }
    }

    /// Create an aggregator with custom configuration.
    pub fn with_config(config: FacetAggregatorConfig) -> Self {
        FacetAggregator { config }
    }

    /// Aggregate the requested facet fields over `docs`.
    ///
    /// `active_filters` drives the `selected` flag on term buckets and the
    /// ring center for geo facets.
    pub fn aggregate(
        &self,
        docs: &[&Document],
        facet_fields: &[String],
        index: &SearchIndex,
        active_filters: &[SearchFilter],
    ) -> Vec<FacetResult> {
        let mut results = Vec::new();

        for field_name in facet_fields {
            let Some(field) = index.get_field(field_name) else {
                warn!(field = %field_name, index = %index.name(), "facet field does not exist, skipping");
                continue;
            };
            if !field.facetable {
                warn!(field = %field_name, index = %index.name(), "field is not facetable, skipping");
                continue;
            }

            let result = match field.field_type {
                FieldType::Text | FieldType::Keyword | FieldType::Boolean => {
                    Some(self.term_facet(docs, field_name, active_filters))
                }
                FieldType::Date => Some(self.date_histogram(docs, field_name)),
                FieldType::Integer | FieldType::Float => Some(self.range_facet(docs, field_name)),
                FieldType::Geo => match active_geo_center(field_name, active_filters) {
                    Some(center) => Some(self.geo_facet(docs, field_name, center)),
                    None => {
                        warn!(
                            field = %field_name,
                            "geo facet needs an active geo_distance filter for its center, skipping"
                        );
                        None
                    }
                },
            };
            results.extend(result);
        }

        results
    }

    /// Group by exact value; count descending, ties by key ascending.
    fn term_facet(
        &self,
        docs: &[&Document],
        field: &str,
        active_filters: &[SearchFilter],
    ) -> FacetResult {
        let mut counts: AHashMap<String, u64> = AHashMap::new();
        for doc in docs {
            for value in field_values(doc, field) {
                *counts.entry(value.to_key()).or_insert(0) += 1;
            }
        }

        let selected = selected_keys(field, active_filters);
        let mut buckets: Vec<FacetBucket> = counts
            .into_iter()
            .map(|(key, count)| FacetBucket {
                selected: selected.iter().any(|s| s == &key),
                ..FacetBucket::term(key, count)
            })
            .collect();

        buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        buckets.truncate(self.config.max_buckets);

        FacetResult::new(field, FacetType::Terms, buckets)
    }

    /// Calendar-month intervals (UTC), chronological order.
    fn date_histogram(&self, docs: &[&Document], field: &str) -> FacetResult {
        let mut counts: AHashMap<(i32, u32), u64> = AHashMap::new();
        for doc in docs {
            for value in field_values(doc, field) {
                if let Some(date) = value.as_date() {
                    *counts.entry((date.year(), date.month())).or_insert(0) += 1;
                }
            }
        }

        let mut months: Vec<((i32, u32), u64)> = counts.into_iter().collect();
        months.sort_by_key(|(month, _)| *month);
        months.truncate(self.config.max_buckets);

        let buckets = months
            .into_iter()
            .map(|((year, month), count)| {
                // First-of-month at midnight UTC is always a valid instant
                let from = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                let to = Utc
                    .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
                    .unwrap();
                FacetBucket {
                    key: format!("{year:04}-{month:02}"),
                    count,
                    selected: false,
                    min: None,
                    max: None,
                    from: Some(from),
                    to: Some(to),
                }
            })
            .collect();

        FacetResult::new(field, FacetType::DateHistogram, buckets)
    }

    /// Equal-width ranges over the observed [min, max], last range
    /// open-ended, so every value lands in exactly one bucket.
    fn range_facet(&self, docs: &[&Document], field: &str) -> FacetResult {
        let mut values: Vec<f64> = Vec::new();
        for doc in docs {
            for value in field_values(doc, field) {
                if let Some(number) = value.as_f64() {
                    values.push(number);
                }
            }
        }

        if values.is_empty() {
            return FacetResult::new(field, FacetType::Range, vec![]);
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut bounds: Vec<(f64, Option<f64>)> = Vec::new();
        if min == max {
            bounds.push((min, None));
        } else {
            let step = (max - min) / RANGE_BUCKETS as f64;
            for i in 0..RANGE_BUCKETS {
                let low = min + i as f64 * step;
                let high = if i == RANGE_BUCKETS - 1 {
                    None
                } else {
                    Some(min + (i + 1) as f64 * step)
                };
                bounds.push((low, high));
            }
        }

        let buckets = bounds
            .into_iter()
            .map(|(low, high)| {
                let count = values
                    .iter()
                    .filter(|&&v| v >= low && high.is_none_or(|h| v < h))
                    .count() as u64;
                let key = match high {
                    Some(high) => format!("[{low:.1} TO {high:.1})"),
                    None => format!("[{low:.1} TO *]"),
                };
                FacetBucket {
                    key,
                    count,
                    selected: false,
                    min: Some(low),
                    max: high,
                    from: None,
                    to: None,
                }
            })
            .collect();

        FacetResult::new(field, FacetType::Range, buckets)
    }

    /// Distance rings around the active geo filter's center.
    fn geo_facet(&self, docs: &[&Document], field: &str, center: GeoPoint) -> FacetResult {
        let mut ring_counts = [0u64; GEO_RINGS.len()];
        for doc in docs {
            for value in field_values(doc, field) {
                if let Some(point) = value.as_geo() {
                    let distance = center.distance_to(point);
                    for (i, (low, high)) in GEO_RINGS.iter().enumerate() {
                        if distance >= *low && high.is_none_or(|h| distance < h) {
                            ring_counts[i] += 1;
                            break;
                        }
                    }
                }
            }
        }

        let buckets = GEO_RINGS
            .iter()
            .zip(ring_counts)
            .map(|((low, high), count)| {
                let key = match high {
                    Some(high) => format!("{low:.0}-{high:.0}km"),
                    None => format!("{low:.0}+km"),
                };
                FacetBucket {
                    key,
                    count,
                    selected: false,
                    min: Some(*low),
                    max: *high,
                    from: None,
                    to: None,
                }
            })
            .collect();

        FacetResult::new(field, FacetType::GeoDistance, buckets)
    }
}

/// Iterate the scalar values of a field, flattening one array level.
fn field_values<'a>(doc: &'a Document, field: &str) -> Vec<&'a FieldValue> {
    match doc.get_field(field) {
        None | Some(FieldValue::Null) => vec![],
        Some(FieldValue::Array(elements)) => {
            elements.iter().filter(|v| !matches!(v, FieldValue::Null)).collect()
        }
        Some(value) => vec![value],
    }
}

/// Bucket keys asserted by active equals/in filters on the field.
fn selected_keys(field: &str, active_filters: &[SearchFilter]) -> Vec<String> {
    let mut keys = Vec::new();
    for filter in active_filters {
        for condition in filter.conditions() {
            if condition.field != field {
                continue;
            }
            match (condition.operator, &condition.value) {
                (FilterOperator::Equals, value) => keys.extend(filter_value_key(value)),
                (FilterOperator::In, FilterValue::List(members)) => {
                    for member in members {
                        keys.extend(filter_value_key(member));
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

fn filter_value_key(value: &FilterValue) -> Option<String> {
    match value {
        FilterValue::Text(s) => Some(s.clone()),
        FilterValue::Number(n) => Some(n.to_string()),
        FilterValue::Boolean(b) => Some(b.to_string()),
        FilterValue::Date(dt) => Some(dt.to_rfc3339()),
        _ => None,
    }
}

/// Center of the first active geo_distance filter on the field.
fn active_geo_center(field: &str, active_filters: &[SearchFilter]) -> Option<GeoPoint> {
    for filter in active_filters {
        for condition in filter.conditions() {
            if condition.field == field
                && condition.operator == FilterOperator::GeoDistance
                && let FilterValue::Geo(GeoQueryValue::Distance { center, .. }) = &condition.value
            {
                return Some(*center);
            }
        }
    }
    None
}
