//! Facet results: aggregated breakdowns of field values across the full
//! filtered result set.

pub mod aggregator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use self::aggregator::{FacetAggregator, FacetAggregatorConfig};

/// The kind of breakdown a facet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetType {
    /// One bucket per distinct value.
    Terms,
    /// Equal-width numeric ranges.
    Range,
    /// Calendar-month intervals.
    DateHistogram,
    /// Distance rings around a query point.
    GeoDistance,
}

/// One group within a facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetBucket {
    /// Bucket key (term, range label, month, or ring label).
    pub key: String,
    /// Number of matching documents (or values, for multi-valued fields).
    pub count: u64,
    /// Whether an active filter on the query already asserts this bucket.
    pub selected: bool,
    /// Lower numeric bound, for range buckets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper numeric bound, for range buckets. `None` means open-ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Interval start, for date-histogram buckets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    /// Interval end, for date-histogram buckets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

impl FacetBucket {
    /// Create a plain term bucket.
    pub fn term<S: Into<String>>(key: S, count: u64) -> Self {
        FacetBucket {
            key: key.into(),
            count,
            selected: false,
            min: None,
            max: None,
            from: None,
            to: None,
        }
    }
}

/// The aggregated breakdown of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
    /// The faceted field.
    pub field: String,
    /// Display name (the field name unless renamed by a caller).
    pub name: String,
    /// Breakdown kind.
    pub facet_type: FacetType,
    /// The buckets. Term buckets sort by count descending, ties by key
    /// ascending; range and date buckets keep their natural order.
    pub buckets: Vec<FacetBucket>,
    /// Sum of all bucket counts.
    pub total: u64,
}

impl FacetResult {
    /// Create a facet result, computing `total` from the buckets.
    pub fn new<S: Into<String>>(field: S, facet_type: FacetType, buckets: Vec<FacetBucket>) -> Self {
        let field = field.into();
        let total = buckets.iter().map(|b| b.count).sum();
        FacetResult {
            name: field.clone(),
            field,
            facet_type,
            buckets,
            total,
        }
    }
}
