//! Compilation of declarative filters into executable predicates.
//!
//! The compiler is the validation chokepoint: every configuration problem
//! (unknown field, missing capability, operator/type mismatch, reversed
//! range) and every compilation problem (oversized regex, nesting too deep)
//! is raised here, before any store call.

pub mod predicate;

use std::cmp::Ordering;

use regex::RegexBuilder;

use crate::error::{Result, SearchError};
use crate::query::filter::{
    BoolOp, FilterCondition, FilterOperator, FilterValue, GeoQueryValue, MAX_FILTER_DEPTH,
    SearchFilter,
};
use crate::query::query::SearchQuery;
use crate::schema::field::{FieldType, IndexField};
use crate::schema::index::SearchIndex;
use crate::util::levenshtein::levenshtein_distance_threshold;

pub use self::predicate::{CompareOp, Predicate, SubstringKind};

/// Compiled regex size bounds. The regex crate matches in linear time, so
/// bounding the compiled program size is what keeps pathological patterns
/// from being accepted.
const REGEX_SIZE_LIMIT: usize = 1 << 20;
const REGEX_DFA_SIZE_LIMIT: usize = 2 << 20;

/// The free-text part of a compiled query.
#[derive(Debug, Clone)]
pub struct TextPlan {
    /// Lowercased whitespace tokens of the query text.
    pub terms: Vec<String>,
    /// Searchable fields with their effective boost (index boost times
    /// query boost).
    pub fields: Vec<(String, f32)>,
    /// Whether terms tolerate small edit distances.
    pub fuzzy: bool,
}

impl TextPlan {
    /// Whether a lowercased document token matches any query term.
    ///
    /// Fuzzy matching tolerates one edit for short terms and two for terms
    /// of five or more characters.
    pub fn matches_token(&self, token: &str) -> bool {
        self.terms.iter().any(|term| {
            token == term
                || (self.fuzzy
                    && levenshtein_distance_threshold(token, term, fuzzy_budget(term)).is_some())
        })
    }
}

/// Maximum edit distance for a fuzzy term match.
fn fuzzy_budget(term: &str) -> usize {
    if term.chars().count() >= 5 { 2 } else { 1 }
}

/// Everything a document store needs to execute one search.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    /// The filter tree as one executable predicate.
    pub predicate: Predicate,
    /// The text-match plan, when the query has free text.
    pub text: Option<TextPlan>,
}

/// Compiles [`SearchFilter`] trees against a [`SearchIndex`].
#[derive(Debug, Default)]
pub struct FilterCompiler;

impl FilterCompiler {
    /// Create a new compiler.
    pub fn new() -> Self {
        FilterCompiler
    }

    /// Compile a whole query: filters plus the text plan.
    pub fn compile_query(&self, query: &SearchQuery, index: &SearchIndex) -> Result<CompiledQuery> {
        let predicate = self.compile(&query.filters, index)?;

        let text = query.text().map(|text| {
            let fields = index
                .searchable_fields()
                .iter()
                .map(|field| {
                    let query_boost = query.boost.get(&field.name).copied().unwrap_or(1.0);
                    (field.name.clone(), field.boost * query_boost)
                })
                .collect();
            TextPlan {
                terms: text.split_whitespace().map(|t| t.to_lowercase()).collect(),
                fields,
                fuzzy: query.fuzzy,
            }
        });

        Ok(CompiledQuery { predicate, text })
    }

    /// Compile a top-level conjunction of filters.
    pub fn compile(&self, filters: &[SearchFilter], index: &SearchIndex) -> Result<Predicate> {
        match filters.len() {
            0 => Ok(Predicate::All),
            1 => self.compile_filter(&filters[0], index, 1),
            _ => Ok(Predicate::And(
                filters
                    .iter()
                    .map(|f| self.compile_filter(f, index, 1))
                    .collect::<Result<Vec<_>>>()?,
            )),
        }
    }

    fn compile_filter(
        &self,
        filter: &SearchFilter,
        index: &SearchIndex,
        depth: usize,
    ) -> Result<Predicate> {
        if depth > MAX_FILTER_DEPTH {
            return Err(SearchError::compilation(format!(
                "filter nesting exceeds maximum depth of {MAX_FILTER_DEPTH}"
            )));
        }

        match filter {
            SearchFilter::Condition(condition) => self.compile_condition(condition, index),
            SearchFilter::Group { op, filters } => {
                if filters.is_empty() {
                    return Err(SearchError::compilation("empty filter group"));
                }
                let children = filters
                    .iter()
                    .map(|f| self.compile_filter(f, index, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(match op {
                    BoolOp::And => Predicate::And(children),
                    BoolOp::Or => Predicate::Or(children),
                    BoolOp::Not => Predicate::Not(children),
                })
            }
        }
    }

    fn compile_condition(
        &self,
        condition: &FilterCondition,
        index: &SearchIndex,
    ) -> Result<Predicate> {
        let field = index.require_field(&condition.field)?;
        if !field.filterable {
            return Err(SearchError::config(
                &field.name,
                "field is not filterable",
            ));
        }

        let name = field.name.clone();
        match condition.operator {
            FilterOperator::Equals | FilterOperator::NotEquals => {
                require_scalar(field, &condition.value, condition.operator)?;
                Ok(Predicate::Equals {
                    field: name,
                    value: condition.value.clone(),
                    negated: condition.operator == FilterOperator::NotEquals,
                })
            }
            FilterOperator::Contains
            | FilterOperator::NotContains
            | FilterOperator::StartsWith
            | FilterOperator::EndsWith => {
                let needle = require_text(field, &condition.value, condition.operator)?;
                let kind = match condition.operator {
                    FilterOperator::StartsWith => SubstringKind::Prefix,
                    FilterOperator::EndsWith => SubstringKind::Suffix,
                    _ => SubstringKind::Contains,
                };
                Ok(Predicate::Substring {
                    field: name,
                    needle: needle.to_lowercase(),
                    kind,
                    negated: condition.operator == FilterOperator::NotContains,
                })
            }
            FilterOperator::GreaterThan
            | FilterOperator::LessThan
            | FilterOperator::GreaterThanOrEqual
            | FilterOperator::LessThanOrEqual => {
                require_orderable(field, &condition.value, condition.operator)?;
                let op = match condition.operator {
                    FilterOperator::GreaterThan => CompareOp::Gt,
                    FilterOperator::LessThan => CompareOp::Lt,
                    FilterOperator::GreaterThanOrEqual => CompareOp::Ge,
                    _ => CompareOp::Le,
                };
                Ok(Predicate::Compare {
                    field: name,
                    op,
                    value: condition.value.clone(),
                })
            }
            FilterOperator::Between => {
                let (low, high) = match &condition.value {
                    FilterValue::List(bounds) if bounds.len() == 2 => {
                        (bounds[0].clone(), bounds[1].clone())
                    }
                    other => {
                        return Err(SearchError::config(
                            &name,
                            format!(
                                "between requires a two-element range, got {}",
                                other.kind()
                            ),
                        ));
                    }
                };
                require_orderable(field, &low, condition.operator)?;
                require_orderable(field, &high, condition.operator)?;
                match compare_filter_values(&low, &high) {
                    Some(Ordering::Greater) => {
                        return Err(SearchError::config(
                            &name,
                            "invalid range: lower bound exceeds upper bound",
                        ));
                    }
                    Some(_) => {}
                    None => {
                        return Err(SearchError::config(
                            &name,
                            "between bounds must be of the same comparable type",
                        ));
                    }
                }
                Ok(Predicate::Between {
                    field: name,
                    low,
                    high,
                })
            }
            FilterOperator::In | FilterOperator::NotIn => {
                let members = match &condition.value {
                    FilterValue::List(members) => members.clone(),
                    other => {
                        return Err(SearchError::config(
                            &name,
                            format!("{:?} requires a list value, got {}", condition.operator, other.kind()),
                        ));
                    }
                };
                for member in &members {
                    require_scalar(field, member, condition.operator)?;
                }
                Ok(Predicate::InSet {
                    field: name,
                    values: members,
                    negated: condition.operator == FilterOperator::NotIn,
                })
            }
            FilterOperator::Exists | FilterOperator::NotExists => Ok(Predicate::Exists {
                field: name,
                negated: condition.operator == FilterOperator::NotExists,
            }),
            FilterOperator::Regex => {
                let pattern = require_text(field, &condition.value, condition.operator)?;
                let regex = RegexBuilder::new(pattern)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .dfa_size_limit(REGEX_DFA_SIZE_LIMIT)
                    .build()
                    .map_err(|e| {
                        SearchError::compilation(format!(
                            "invalid regex for field '{name}': {e}"
                        ))
                    })?;
                Ok(Predicate::Matches {
                    field: name,
                    pattern: regex,
                })
            }
            FilterOperator::GeoDistance => {
                require_geo_field(field)?;
                match &condition.value {
                    FilterValue::Geo(GeoQueryValue::Distance { center, radius_km }) => {
                        if *radius_km <= 0.0 {
                            return Err(SearchError::config(
                                &name,
                                "geo_distance radius must be positive",
                            ));
                        }
                        Ok(Predicate::GeoDistance {
                            field: name,
                            center: *center,
                            radius_km: *radius_km,
                        })
                    }
                    other => Err(SearchError::config(
                        &name,
                        format!(
                            "geo_distance requires a center and radius, got {}",
                            other.kind()
                        ),
                    )),
                }
            }
            FilterOperator::GeoBoundingBox => {
                require_geo_field(field)?;
                match &condition.value {
                    FilterValue::Geo(GeoQueryValue::BoundingBox(bbox)) => Ok(Predicate::GeoBox {
                        field: name,
                        bbox: bbox.clone(),
                    }),
                    other => Err(SearchError::config(
                        &name,
                        format!(
                            "geo_bounding_box requires a bounding box, got {}",
                            other.kind()
                        ),
                    )),
                }
            }
        }
    }
}

/// Check that a scalar filter value matches the field's type.
fn require_scalar(
    field: &IndexField,
    value: &FilterValue,
    operator: FilterOperator,
) -> Result<()> {
    let compatible = matches!(
        (field.field_type, value),
        (FieldType::Text | FieldType::Keyword, FilterValue::Text(_))
            | (FieldType::Integer | FieldType::Float, FilterValue::Number(_))
            | (FieldType::Date, FilterValue::Date(_))
            | (FieldType::Boolean, FilterValue::Boolean(_))
    );
    if compatible {
        Ok(())
    } else {
        Err(SearchError::config(
            &field.name,
            format!(
                "operator {operator:?} cannot apply a {} value to a {} field",
                value.kind(),
                field.field_type
            ),
        ))
    }
}

/// Check that the value is text and the field holds strings.
fn require_text<'v>(
    field: &IndexField,
    value: &'v FilterValue,
    operator: FilterOperator,
) -> Result<&'v str> {
    if !matches!(field.field_type, FieldType::Text | FieldType::Keyword) {
        return Err(SearchError::config(
            &field.name,
            format!(
                "operator {operator:?} requires a text or keyword field, not {}",
                field.field_type
            ),
        ));
    }
    match value {
        FilterValue::Text(text) => Ok(text),
        other => Err(SearchError::config(
            &field.name,
            format!("operator {operator:?} requires a text value, got {}", other.kind()),
        )),
    }
}

/// Check that the field is orderable and the value matches its type.
fn require_orderable(
    field: &IndexField,
    value: &FilterValue,
    operator: FilterOperator,
) -> Result<()> {
    if !field.field_type.is_orderable() {
        return Err(SearchError::config(
            &field.name,
            format!(
                "operator {operator:?} requires an orderable field, not {}",
                field.field_type
            ),
        ));
    }
    let compatible = matches!(
        (field.field_type, value),
        (FieldType::Integer | FieldType::Float, FilterValue::Number(_))
            | (FieldType::Date, FilterValue::Date(_))
    );
    if compatible {
        Ok(())
    } else {
        Err(SearchError::config(
            &field.name,
            format!(
                "operator {operator:?} cannot compare a {} value against a {} field",
                value.kind(),
                field.field_type
            ),
        ))
    }
}

fn require_geo_field(field: &IndexField) -> Result<()> {
    if field.field_type == FieldType::Geo {
        Ok(())
    } else {
        Err(SearchError::config(
            &field.name,
            format!("geo operators require a geo field, not {}", field.field_type),
        ))
    }
}

/// Comparison between two filter values of the same kind.
fn compare_filter_values(a: &FilterValue, b: &FilterValue) -> Option<Ordering> {
    match (a, b) {
        (FilterValue::Number(x), FilterValue::Number(y)) => x.partial_cmp(y),
        (FilterValue::Date(x), FilterValue::Date(y)) => Some(x.cmp(y)),
        (FilterValue::Text(x), FilterValue::Text(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
