//! Executable predicates compiled from declarative filters.

use std::cmp::Ordering;

use regex::Regex;

use crate::document::{Document, FieldValue};
use crate::geo::{GeoBoundingBox, GeoPoint};
use crate::query::filter::FilterValue;

/// Comparison operators over orderable values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Strictly greater.
    Gt,
    /// Strictly less.
    Lt,
    /// Greater or equal.
    Ge,
    /// Less or equal.
    Le,
}

impl CompareOp {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        }
    }
}

/// Substring match positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstringKind {
    /// Anywhere in the value.
    Contains,
    /// At the start of the value.
    Prefix,
    /// At the end of the value.
    Suffix,
}

/// A compiled, executable condition tree.
///
/// Evaluation short-circuits through `And`/`Or`/`Not` in order. A leaf on a
/// multi-valued (array) field matches when any element matches.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Matches every document.
    All,
    /// Exact match on the raw field value. `negated` flips the result.
    Equals {
        /// Target field.
        field: String,
        /// Expected value.
        value: FilterValue,
        /// Whether the result is inverted.
        negated: bool,
    },
    /// Case-insensitive substring/prefix/suffix match.
    Substring {
        /// Target field.
        field: String,
        /// Lowercased needle.
        needle: String,
        /// Match position.
        kind: SubstringKind,
        /// Whether the result is inverted.
        negated: bool,
    },
    /// Total-order comparison.
    Compare {
        /// Target field.
        field: String,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand value.
        value: FilterValue,
    },
    /// Inclusive range.
    Between {
        /// Target field.
        field: String,
        /// Lower bound, inclusive.
        low: FilterValue,
        /// Upper bound, inclusive.
        high: FilterValue,
    },
    /// Set membership. Empty set matches nothing; negated empty set matches
    /// everything.
    InSet {
        /// Target field.
        field: String,
        /// The member values.
        values: Vec<FilterValue>,
        /// Whether the result is inverted.
        negated: bool,
    },
    /// Field presence. A `Null` value counts as absent.
    Exists {
        /// Target field.
        field: String,
        /// Whether the result is inverted.
        negated: bool,
    },
    /// Regular expression over the field's string form.
    Matches {
        /// Target field.
        field: String,
        /// Compiled pattern.
        pattern: Regex,
    },
    /// Within a radius of a center point.
    GeoDistance {
        /// Target field.
        field: String,
        /// Circle center.
        center: GeoPoint,
        /// Radius in kilometers.
        radius_km: f64,
    },
    /// Within a bounding box.
    GeoBox {
        /// Target field.
        field: String,
        /// The box.
        bbox: GeoBoundingBox,
    },
    /// All children match.
    And(Vec<Predicate>),
    /// At least one child matches.
    Or(Vec<Predicate>),
    /// No child matches.
    Not(Vec<Predicate>),
}

impl Predicate {
    /// Evaluate this predicate against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Equals {
                field,
                value,
                negated,
            } => {
                let hit = any_value(doc, field, |v| value_equals(v, value));
                hit != *negated
            }
            Predicate::Substring {
                field,
                needle,
                kind,
                negated,
            } => {
                let hit = any_value(doc, field, |v| {
                    v.as_text().is_some_and(|text| {
                        let haystack = text.to_lowercase();
                        match kind {
                            SubstringKind::Contains => haystack.contains(needle.as_str()),
                            SubstringKind::Prefix => haystack.starts_with(needle.as_str()),
                            SubstringKind::Suffix => haystack.ends_with(needle.as_str()),
                        }
                    })
                });
                hit != *negated
            }
            Predicate::Compare { field, op, value } => any_value(doc, field, |v| {
                value_compare(v, value).is_some_and(|ordering| op.accepts(ordering))
            }),
            Predicate::Between { field, low, high } => any_value(doc, field, |v| {
                value_compare(v, low).is_some_and(|o| o != Ordering::Less)
                    && value_compare(v, high).is_some_and(|o| o != Ordering::Greater)
            }),
            Predicate::InSet {
                field,
                values,
                negated,
            } => {
                let hit = any_value(doc, field, |v| values.iter().any(|m| value_equals(v, m)));
                hit != *negated
            }
            Predicate::Exists { field, negated } => doc.has_field(field) != *negated,
            Predicate::Matches { field, pattern } => {
                any_value(doc, field, |v| pattern.is_match(&v.to_key()))
            }
            Predicate::GeoDistance {
                field,
                center,
                radius_km,
            } => any_value(doc, field, |v| {
                v.as_geo()
                    .is_some_and(|point| center.distance_to(point) <= *radius_km)
            }),
            Predicate::GeoBox { field, bbox } => {
                any_value(doc, field, |v| v.as_geo().is_some_and(|p| bbox.contains(p)))
            }
            Predicate::And(children) => children.iter().all(|p| p.matches(doc)),
            Predicate::Or(children) => children.iter().any(|p| p.matches(doc)),
            Predicate::Not(children) => !children.iter().any(|p| p.matches(doc)),
        }
    }
}

/// Apply `f` to the field's value, or to each element of an array value.
fn any_value<F: Fn(&FieldValue) -> bool>(doc: &Document, field: &str, f: F) -> bool {
    match doc.get_field(field) {
        None | Some(FieldValue::Null) => false,
        Some(FieldValue::Array(elements)) => elements.iter().any(f),
        Some(value) => f(value),
    }
}

/// Exact equality between a document value and a filter value.
fn value_equals(doc_value: &FieldValue, filter_value: &FilterValue) -> bool {
    match (doc_value, filter_value) {
        (FieldValue::Text(a), FilterValue::Text(b)) => a == b,
        (FieldValue::Boolean(a), FilterValue::Boolean(b)) => a == b,
        (FieldValue::Date(a), FilterValue::Date(b)) => a == b,
        (FieldValue::Integer(a), FilterValue::Number(b)) => (*a as f64) == *b,
        (FieldValue::Float(a), FilterValue::Number(b)) => a == b,
        _ => false,
    }
}

/// Total-order comparison between a document value and a filter value.
fn value_compare(doc_value: &FieldValue, filter_value: &FilterValue) -> Option<Ordering> {
    match (doc_value, filter_value) {
        (FieldValue::Integer(a), FilterValue::Number(b)) => (*a as f64).partial_cmp(b),
        (FieldValue::Float(a), FilterValue::Number(b)) => a.partial_cmp(b),
        (FieldValue::Date(a), FilterValue::Date(b)) => Some(a.cmp(b)),
        (FieldValue::Text(a), FilterValue::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc() -> Document {
        Document::builder("d1")
            .text("role", "learner")
            .integer("age", 30)
            .array(
                "tags",
                vec![
                    FieldValue::Text("rust".to_string()),
                    FieldValue::Text("search".to_string()),
                ],
            )
            .geo("location", 35.6812, 139.7671)
            .build()
    }

    #[test]
    fn test_equals() {
        let d = doc();
        let p = Predicate::Equals {
            field: "role".to_string(),
            value: FilterValue::text("learner"),
            negated: false,
        };
        assert!(p.matches(&d));

        let p = Predicate::Equals {
            field: "role".to_string(),
            value: FilterValue::text("Learner"),
            negated: false,
        };
        // Equals is raw-value match, case-sensitive
        assert!(!p.matches(&d));

        let p = Predicate::Equals {
            field: "role".to_string(),
            value: FilterValue::text("teacher"),
            negated: true,
        };
        assert!(p.matches(&d));
    }

    #[test]
    fn test_substring_case_insensitive() {
        let d = doc();
        let p = Predicate::Substring {
            field: "role".to_string(),
            needle: "earn".to_string(),
            kind: SubstringKind::Contains,
            negated: false,
        };
        assert!(p.matches(&d));

        let p = Predicate::Substring {
            field: "role".to_string(),
            needle: "lear".to_string(),
            kind: SubstringKind::Prefix,
            negated: false,
        };
        assert!(p.matches(&d));

        let p = Predicate::Substring {
            field: "role".to_string(),
            needle: "ner".to_string(),
            kind: SubstringKind::Suffix,
            negated: false,
        };
        assert!(p.matches(&d));
    }

    #[test]
    fn test_compare_and_between() {
        let d = doc();
        let p = Predicate::Compare {
            field: "age".to_string(),
            op: CompareOp::Ge,
            value: FilterValue::Number(30.0),
        };
        assert!(p.matches(&d));

        let p = Predicate::Compare {
            field: "age".to_string(),
            op: CompareOp::Gt,
            value: FilterValue::Number(30.0),
        };
        assert!(!p.matches(&d));

        let p = Predicate::Between {
            field: "age".to_string(),
            low: FilterValue::Number(18.0),
            high: FilterValue::Number(60.0),
        };
        assert!(p.matches(&d));

        // Bounds are inclusive
        let p = Predicate::Between {
            field: "age".to_string(),
            low: FilterValue::Number(30.0),
            high: FilterValue::Number(30.0),
        };
        assert!(p.matches(&d));
    }

    #[test]
    fn test_in_set_empty_semantics() {
        let d = doc();
        let p = Predicate::InSet {
            field: "role".to_string(),
            values: vec![],
            negated: false,
        };
        assert!(!p.matches(&d));

        let p = Predicate::InSet {
            field: "role".to_string(),
            values: vec![],
            negated: true,
        };
        assert!(p.matches(&d));
    }

    #[test]
    fn test_array_field_any_element() {
        let d = doc();
        let p = Predicate::Equals {
            field: "tags".to_string(),
            value: FilterValue::text("rust"),
            negated: false,
        };
        assert!(p.matches(&d));

        let p = Predicate::Equals {
            field: "tags".to_string(),
            value: FilterValue::text("python"),
            negated: false,
        };
        assert!(!p.matches(&d));
    }

    #[test]
    fn test_exists() {
        let d = doc();
        let p = Predicate::Exists {
            field: "role".to_string(),
            negated: false,
        };
        assert!(p.matches(&d));

        let p = Predicate::Exists {
            field: "missing".to_string(),
            negated: false,
        };
        assert!(!p.matches(&d));

        let p = Predicate::Exists {
            field: "missing".to_string(),
            negated: true,
        };
        assert!(p.matches(&d));
    }

    #[test]
    fn test_geo_distance() {
        let d = doc();
        let tokyo_station = GeoPoint::new(35.6812, 139.7671).unwrap();
        let p = Predicate::GeoDistance {
            field: "location".to_string(),
            center: tokyo_station,
            radius_km: 1.0,
        };
        assert!(p.matches(&d));

        let osaka = GeoPoint::new(34.6937, 135.5023).unwrap();
        let p = Predicate::GeoDistance {
            field: "location".to_string(),
            center: osaka,
            radius_km: 100.0,
        };
        assert!(!p.matches(&d));
    }

    #[test]
    fn test_boolean_composition() {
        let d = doc();
        let learner = Predicate::Equals {
            field: "role".to_string(),
            value: FilterValue::text("learner"),
            negated: false,
        };
        let teacher = Predicate::Equals {
            field: "role".to_string(),
            value: FilterValue::text("teacher"),
            negated: false,
        };

        assert!(Predicate::Or(vec![learner.clone(), teacher.clone()]).matches(&d));
        assert!(!Predicate::And(vec![learner.clone(), teacher.clone()]).matches(&d));
        assert!(Predicate::Not(vec![teacher]).matches(&d));
        assert!(!Predicate::Not(vec![learner]).matches(&d));
        assert!(Predicate::All.matches(&d));
    }
}
