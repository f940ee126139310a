//! The search engine: resolve, validate, compile, execute, aggregate,
//! assemble, record.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::compiler::FilterCompiler;
use crate::document::Document;
use crate::error::Result;
use crate::facet::FacetAggregator;
use crate::history::{PopularTerm, SearchHistory, SearchRecord, SearchStats};
use crate::query::query::SearchQuery;
use crate::schema::index::SearchIndex;
use crate::schema::registry::IndexRegistry;
use crate::search::assembler::{ResultAssembler, SearchResult};
use crate::search::highlight::{HighlightResult, Highlighter};
use crate::search::store::DocumentStore;
use crate::search::suggest::Suggester;

/// Engine-level configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Deadline applied to each store call. `None` disables the deadline.
    pub timeout: Option<Duration>,
    /// How many search records the history tracker retains.
    pub history_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            timeout: Some(Duration::from_secs(10)),
            history_capacity: 1000,
        }
    }
}

/// A faceted search engine over a pluggable document store.
///
/// An explicit, constructed object: create one at startup and share it by
/// reference. Searches are stateless per request; the only mutable state is
/// the index registry and the history tracker, both safe under concurrent
/// use.
pub struct SearchEngine {
    registry: IndexRegistry,
    store: Arc<dyn DocumentStore>,
    compiler: FilterCompiler,
    aggregator: FacetAggregator,
    assembler: ResultAssembler,
    highlighter: Highlighter,
    suggester: Suggester,
    history: SearchHistory,
    config: SearchConfig,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("indexes", &self.registry.names())
            .field("config", &self.config)
            .finish()
    }
}

impl SearchEngine {
    /// Create an engine with default configuration.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, SearchConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: SearchConfig) -> Self {
        SearchEngine {
            registry: IndexRegistry::new(),
            store,
            compiler: FilterCompiler::new(),
            aggregator: FacetAggregator::new(),
            assembler: ResultAssembler::new(),
            highlighter: Highlighter::new(),
            suggester: Suggester::new(),
            history: SearchHistory::new(config.history_capacity),
            config,
        }
    }

    /// Register an index definition. Idempotent per name: re-registering
    /// replaces the prior definition, visible to new searches.
    pub fn create_index(&self, index: SearchIndex) {
        self.registry.register(index);
    }

    /// Get a registered index definition.
    pub fn get_index(&self, name: &str) -> Option<Arc<SearchIndex>> {
        self.registry.get(name)
    }

    /// Register synonym expansions used by the suggester.
    pub fn add_synonyms<S, I, A>(&mut self, term: S, alternatives: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.suggester.add_synonyms(term, alternatives);
    }

    /// Execute a search and return matched documents.
    ///
    /// Configuration and compilation errors surface before the store is
    /// called; a failed search returns no partial result. A facet requested
    /// on a non-facetable field is omitted from `facets` without failing
    /// the search.
    pub fn search(&self, index_name: &str, query: &SearchQuery) -> Result<SearchResult<Document>> {
        let started = Instant::now();
        let deadline = self.config.timeout.map(|timeout| started + timeout);

        let index = self.registry.resolve(index_name)?;
        self.assembler.validate_pagination(&query.pagination)?;
        self.assembler.validate_sort(&query.sort, &index)?;
        let compiled = self.compiler.compile_query(query, &index)?;

        let mut matches = self.store.execute(&index, &compiled, deadline)?;

        // Facets reflect the full filtered result set, never the page.
        let doc_refs: Vec<&Document> = matches.iter().map(|m| &m.doc).collect();
        let facets = self
            .aggregator
            .aggregate(&doc_refs, &query.facets, &index, &query.filters);
        drop(doc_refs);

        let total = matches.len() as u64;
        self.assembler
            .sort(&mut matches, &query.sort, compiled.text.is_some());
        let page = self.assembler.paginate(matches, &query.pagination);

        let mut highlights: HashMap<String, Vec<HighlightResult>> = HashMap::new();
        if query.highlight
            && let Some(plan) = &compiled.text
        {
            for scored in &page {
                let results = self.highlighter.highlight(&scored.doc, plan);
                if !results.is_empty() {
                    highlights.insert(scored.doc.id().to_string(), results);
                }
            }
        }

        let suggestions = match query.text() {
            Some(text) => self.suggester.suggest(text, &self.history),
            None => Vec::new(),
        };

        let search_time_ms = started.elapsed().as_millis() as u64;
        self.history
            .record(query.text(), query.filters.len(), total, search_time_ms);
        debug!(
            index = index_name,
            total,
            took_ms = search_time_ms,
            "search executed"
        );

        let items = page.into_iter().map(|scored| scored.doc).collect();
        Ok(self.assembler.assemble(
            items,
            total,
            query,
            facets,
            highlights,
            suggestions,
            search_time_ms,
        ))
    }

    /// Execute a search and deserialize each item into `T` via its JSON
    /// form.
    pub fn search_as<T: DeserializeOwned>(
        &self,
        index_name: &str,
        query: &SearchQuery,
    ) -> Result<SearchResult<T>> {
        self.search(index_name, query)?
            .try_map(|doc| Ok(serde_json::from_value(doc.to_json())?))
    }

    /// The most recent searches, newest first.
    pub fn search_history(&self, limit: usize) -> Vec<SearchRecord> {
        self.history.recent(limit)
    }

    /// Aggregate statistics over recorded searches.
    pub fn search_stats(&self) -> SearchStats {
        self.history.stats()
    }

    /// The most frequent query terms, ties broken by first appearance.
    pub fn popular_searches(&self, limit: usize) -> Vec<PopularTerm> {
        self.history.popular(limit)
    }
}
