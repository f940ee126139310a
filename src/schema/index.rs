//! Search index definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::schema::field::IndexField;

/// Opaque pass-through configuration for a backing store.
///
/// The engine does not interpret these values; a distributed backend may.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Number of shards requested from the backend.
    pub shards: u32,
    /// Number of replicas requested from the backend.
    pub replicas: u32,
}

impl Default for IndexSettings {
    fn default() -> Self {
        IndexSettings {
            shards: 1,
            replicas: 0,
        }
    }
}

/// A named schema describing which fields exist and what each supports.
///
/// Index definitions are created once and are read-only during query
/// execution; they own no per-request state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndex {
    /// Index name.
    name: String,
    /// Map of field names to their definitions.
    fields: HashMap<String, IndexField>,
    /// Ordered list of field names (for consistent ordering).
    field_names: Vec<String>,
    /// Backend pass-through settings.
    settings: IndexSettings,
}

impl SearchIndex {
    /// Get the index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a field definition by name.
    pub fn get_field(&self, name: &str) -> Option<&IndexField> {
        self.fields.get(name)
    }

    /// Check if a field exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Get all field names in the order they were added.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Get the backend settings.
    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the index has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields that participate in free-text matching, in declaration order.
    pub fn searchable_fields(&self) -> Vec<&IndexField> {
        self.field_names
            .iter()
            .filter_map(|name| self.fields.get(name))
            .filter(|field| field.searchable)
            .collect()
    }

    /// Resolve a field, failing with a config error when it is missing.
    pub fn require_field(&self, name: &str) -> Result<&IndexField> {
        self.fields.get(name).ok_or_else(|| {
            SearchError::config(name, format!("field does not exist in index '{}'", self.name))
        })
    }

    /// Create a builder for constructing an index definition.
    pub fn builder<S: Into<String>>(name: S) -> SearchIndexBuilder {
        SearchIndexBuilder::new(name)
    }
}

/// A builder for constructing index definitions in a fluent manner.
#[derive(Debug)]
pub struct SearchIndexBuilder {
    name: String,
    fields: HashMap<String, IndexField>,
    field_names: Vec<String>,
    settings: IndexSettings,
    duplicate: Option<String>,
}

impl SearchIndexBuilder {
    /// Create a new index builder.
    pub fn new<S: Into<String>>(name: S) -> Self {
        SearchIndexBuilder {
            name: name.into(),
            fields: HashMap::new(),
            field_names: Vec::new(),
            settings: IndexSettings::default(),
            duplicate: None,
        }
    }

    /// Add a field definition. Duplicate names are rejected at `build()`.
    pub fn field(mut self, field: IndexField) -> Self {
        if self.fields.contains_key(&field.name) {
            self.duplicate.get_or_insert(field.name.clone());
            return self;
        }
        self.field_names.push(field.name.clone());
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Set the backend pass-through settings.
    pub fn settings(mut self, settings: IndexSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the final index definition.
    pub fn build(self) -> Result<SearchIndex> {
        if self.name.is_empty() {
            return Err(SearchError::other("Index name cannot be empty"));
        }
        if let Some(name) = self.duplicate {
            return Err(SearchError::config(name, "duplicate field name in index"));
        }
        if self.fields.is_empty() {
            return Err(SearchError::other(format!(
                "Index '{}' must have at least one field",
                self.name
            )));
        }
        for name in self.fields.keys() {
            if name.is_empty() {
                return Err(SearchError::other("Field name cannot be empty"));
            }
        }

        Ok(SearchIndex {
            name: self.name,
            fields: self.fields,
            field_names: self.field_names,
            settings: self.settings,
        })
    }
}
