//! Field definitions and per-field capabilities.

use serde::{Deserialize, Serialize};

/// The type of values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Analyzed free text.
    Text,
    /// Exact, untokenized string (identifiers, tags, enums).
    Keyword,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// UTC datetime.
    Date,
    /// Boolean flag.
    Boolean,
    /// Geographical point.
    Geo,
}

impl FieldType {
    /// Whether values of this type have a total order usable by comparison
    /// operators and range facets.
    pub fn is_orderable(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Date)
    }

    /// Whether this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Whether values of this type group into term buckets when faceted.
    pub fn supports_term_buckets(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Keyword | FieldType::Boolean)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Geo => "geo",
        };
        write!(f, "{name}")
    }
}

/// A named field within a search index, with its capability flags.
///
/// Capabilities gate what a query may do with the field: a filter requires
/// `filterable`, a sort requires `sortable`, a facet requires `facetable`,
/// and free-text matching only visits `searchable` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexField {
    /// Field name, unique within the index.
    pub name: String,
    /// Value type.
    pub field_type: FieldType,
    /// Participates in free-text matching.
    pub searchable: bool,
    /// May appear in filters.
    pub filterable: bool,
    /// May appear in sort options.
    pub sortable: bool,
    /// May be faceted.
    pub facetable: bool,
    /// Relevance weight for text matches in this field.
    pub boost: f32,
}

impl IndexField {
    /// Create a new field with all capabilities disabled and boost 1.0.
    pub fn new<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        IndexField {
            name: name.into(),
            field_type,
            searchable: false,
            filterable: false,
            sortable: false,
            facetable: false,
            boost: 1.0,
        }
    }

    /// Set whether the field participates in free-text matching.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Set whether the field may appear in filters.
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// Set whether the field may appear in sort options.
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Set whether the field may be faceted.
    pub fn facetable(mut self, facetable: bool) -> Self {
        self.facetable = facetable;
        self
    }

    /// Set the relevance weight for text matches in this field.
    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}
