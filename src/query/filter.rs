//! Declarative filters: operators, typed values, and the filter tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{GeoBoundingBox, GeoPoint};

/// Maximum nesting depth of a filter tree. Compilation rejects anything
/// deeper.
pub const MAX_FILTER_DEPTH: usize = 10;

/// The closed set of filter operators.
///
/// Substring operators (`Contains`, `NotContains`, `StartsWith`,
/// `EndsWith`) match case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Exact match on the raw field value.
    Equals,
    /// Exact mismatch on the raw field value.
    NotEquals,
    /// Substring match.
    Contains,
    /// Substring mismatch.
    NotContains,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// Strictly greater, orderable fields only.
    GreaterThan,
    /// Strictly less, orderable fields only.
    LessThan,
    /// Greater or equal, orderable fields only.
    GreaterThanOrEqual,
    /// Less or equal, orderable fields only.
    LessThanOrEqual,
    /// Inclusive range over a two-element ordered list.
    Between,
    /// Set membership; an empty set matches nothing.
    In,
    /// Set exclusion; an empty set matches everything.
    NotIn,
    /// The field is present with a non-null value.
    Exists,
    /// The field is absent or null.
    NotExists,
    /// Regular expression over the field's string form.
    Regex,
    /// Within a radius of a center point, geo fields only.
    GeoDistance,
    /// Within a bounding box, geo fields only.
    GeoBoundingBox,
}

impl FilterOperator {
    /// Whether the operator needs a field with a total order.
    pub fn requires_orderable(&self) -> bool {
        matches!(
            self,
            FilterOperator::GreaterThan
                | FilterOperator::LessThan
                | FilterOperator::GreaterThanOrEqual
                | FilterOperator::LessThanOrEqual
                | FilterOperator::Between
        )
    }

    /// Whether the operator needs a geo field.
    pub fn requires_geo(&self) -> bool {
        matches!(
            self,
            FilterOperator::GeoDistance | FilterOperator::GeoBoundingBox
        )
    }

    /// Whether the operator ignores its value entirely.
    pub fn is_presence(&self) -> bool {
        matches!(self, FilterOperator::Exists | FilterOperator::NotExists)
    }
}

/// Geo-valued filter payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoQueryValue {
    /// A center point and a radius in kilometers.
    Distance {
        /// Center of the search circle.
        center: GeoPoint,
        /// Radius in kilometers.
        radius_km: f64,
    },
    /// A rectangular bounding box.
    BoundingBox(GeoBoundingBox),
}

/// A typed filter value.
///
/// The variant declares how the value is interpreted, so operator/type
/// mismatches surface as configuration errors during compilation instead of
/// deep inside aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// UTC datetime value.
    Date(DateTime<Utc>),
    /// Boolean value.
    Boolean(bool),
    /// List of values, for `In`/`NotIn`/`Between`.
    List(Vec<FilterValue>),
    /// Geo payload, for `GeoDistance`/`GeoBoundingBox`.
    Geo(GeoQueryValue),
    /// No value, for presence operators.
    None,
}

impl FilterValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FilterValue::Text(_) => "text",
            FilterValue::Number(_) => "number",
            FilterValue::Date(_) => "date",
            FilterValue::Boolean(_) => "boolean",
            FilterValue::List(_) => "list",
            FilterValue::Geo(_) => "geo",
            FilterValue::None => "none",
        }
    }

    /// Convenience constructor for a text value.
    pub fn text<S: Into<String>>(value: S) -> Self {
        FilterValue::Text(value.into())
    }

    /// Convenience constructor for a list of numbers.
    pub fn numbers<I: IntoIterator<Item = f64>>(values: I) -> Self {
        FilterValue::List(values.into_iter().map(FilterValue::Number).collect())
    }

    /// Convenience constructor for a list of text values.
    pub fn texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::List(
            values
                .into_iter()
                .map(|v| FilterValue::Text(v.into()))
                .collect(),
        )
    }
}

/// Boolean composition of filter sub-groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    /// All children must match.
    And,
    /// At least one child must match.
    Or,
    /// No child may match.
    Not,
}

/// A single field condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// The field the condition applies to.
    pub field: String,
    /// The operator.
    pub operator: FilterOperator,
    /// The typed value.
    pub value: FilterValue,
}

/// A filter: either a single condition or a boolean group of sub-filters.
///
/// The top level of a query is a conjunction of these; groups provide
/// OR/NOT composition. Nesting is bounded by [`MAX_FILTER_DEPTH`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilter {
    /// A leaf condition on one field.
    Condition(FilterCondition),
    /// A boolean group of sub-filters.
    Group {
        /// How the children combine.
        op: BoolOp,
        /// The sub-filters.
        filters: Vec<SearchFilter>,
    },
}

impl SearchFilter {
    /// Create a leaf condition.
    pub fn condition<S: Into<String>>(
        field: S,
        operator: FilterOperator,
        value: FilterValue,
    ) -> Self {
        SearchFilter::Condition(FilterCondition {
            field: field.into(),
            operator,
            value,
        })
    }

    /// Create a group where all children must match.
    pub fn all(filters: Vec<SearchFilter>) -> Self {
        SearchFilter::Group {
            op: BoolOp::And,
            filters,
        }
    }

    /// Create a group where at least one child must match.
    pub fn any(filters: Vec<SearchFilter>) -> Self {
        SearchFilter::Group {
            op: BoolOp::Or,
            filters,
        }
    }

    /// Create a group where no child may match.
    pub fn none(filters: Vec<SearchFilter>) -> Self {
        SearchFilter::Group {
            op: BoolOp::Not,
            filters,
        }
    }

    /// Depth of this filter tree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        match self {
            SearchFilter::Condition(_) => 1,
            SearchFilter::Group { filters, .. } => {
                1 + filters.iter().map(|f| f.depth()).max().unwrap_or(0)
            }
        }
    }

    /// Iterate over all leaf conditions in this tree.
    pub fn conditions(&self) -> Vec<&FilterCondition> {
        match self {
            SearchFilter::Condition(condition) => vec![condition],
            SearchFilter::Group { filters, .. } => {
                filters.iter().flat_map(|f| f.conditions()).collect()
            }
        }
    }
}
