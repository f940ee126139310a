//! Registry of named index definitions.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, SearchError};
use crate::schema::index::SearchIndex;

/// Holds named [`SearchIndex`] definitions.
///
/// Reads take a cheap snapshot of the current map; registration clones the
/// map, inserts, and swaps the `Arc`, so concurrent readers never observe a
/// partially-updated registry. Registration is idempotent per name:
/// re-registering replaces the prior definition, visible to new searches.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indexes: RwLock<Arc<HashMap<String, Arc<SearchIndex>>>>,
}

impl IndexRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        IndexRegistry {
            indexes: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Register an index definition under its name.
    pub fn register(&self, index: SearchIndex) {
        let mut guard = self.indexes.write();
        let mut next = HashMap::clone(&guard);
        next.insert(index.name().to_string(), Arc::new(index));
        *guard = Arc::new(next);
    }

    /// Get an index definition by name.
    pub fn get(&self, name: &str) -> Option<Arc<SearchIndex>> {
        self.indexes.read().get(name).cloned()
    }

    /// Resolve an index, failing when the name is unknown.
    pub fn resolve(&self, name: &str) -> Result<Arc<SearchIndex>> {
        self.get(name)
            .ok_or_else(|| SearchError::unknown_index(name))
    }

    /// Remove an index definition. Returns whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut guard = self.indexes.write();
        if !guard.contains_key(name) {
            return false;
        }
        let mut next = HashMap::clone(&guard);
        next.remove(name);
        *guard = Arc::new(next);
        true
    }

    /// Names of all registered indexes.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered indexes.
    pub fn len(&self) -> usize {
        self.indexes.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.indexes.read().is_empty()
    }
}
