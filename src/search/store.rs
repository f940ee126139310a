//! The document store boundary and the in-memory reference store.

use std::time::Instant;

use ahash::AHashMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

use crate::compiler::{CompiledQuery, TextPlan};
use crate::document::{Document, FieldValue};
use crate::error::{Result, SearchError};
use crate::schema::index::SearchIndex;

/// A document with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// The matched document.
    pub doc: Document,
    /// Relevance score; 1.0 for pure filter matches.
    pub score: f32,
}

/// What the engine requires from a backing store: evaluate a compiled query
/// against one index and return every match, unsorted and unpaginated.
///
/// The engine is agnostic to what sits behind this trait; an inverted
/// index, a SQL store, or a remote search service all qualify. A store must
/// respect the deadline by failing with a timeout error rather than
/// hanging; the engine performs no hidden retries.
pub trait DocumentStore: Send + Sync {
    /// Execute a compiled query and return all matches.
    fn execute(
        &self,
        index: &SearchIndex,
        query: &CompiledQuery,
        deadline: Option<Instant>,
    ) -> Result<Vec<ScoredDocument>>;
}

/// Score one document against a text plan.
///
/// A document matches when any query term matches a token of any
/// searchable field; the score sums matched tokens weighted by the field's
/// effective boost.
fn text_score(doc: &Document, plan: &TextPlan) -> f32 {
    let mut score = 0.0f32;
    for (field, boost) in &plan.fields {
        let texts: Vec<&str> = match doc.get_field(field) {
            Some(FieldValue::Text(text)) => vec![text.as_str()],
            Some(FieldValue::Array(elements)) => {
                elements.iter().filter_map(|v| v.as_text()).collect()
            }
            _ => continue,
        };
        for text in texts {
            for token in text.unicode_words() {
                if plan.matches_token(&token.to_lowercase()) {
                    score += boost;
                }
            }
        }
    }
    score
}

/// An in-memory reference store.
///
/// Documents are held per index name; `execute` evaluates the predicate
/// tree over the whole corpus in parallel. Useful as the default backend
/// and for tests; not a persistence layer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    corpora: RwLock<AHashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemoryStore {
            corpora: RwLock::new(AHashMap::new()),
        }
    }

    /// Insert or replace a document (by id) in an index's corpus.
    pub fn upsert<S: Into<String>>(&self, index_name: S, doc: Document) {
        let mut corpora = self.corpora.write();
        let corpus = corpora.entry(index_name.into()).or_default();
        if let Some(existing) = corpus.iter_mut().find(|d| d.id() == doc.id()) {
            *existing = doc;
        } else {
            corpus.push(doc);
        }
    }

    /// Remove a document by id. Returns whether it existed.
    pub fn remove(&self, index_name: &str, doc_id: &str) -> bool {
        let mut corpora = self.corpora.write();
        match corpora.get_mut(index_name) {
            Some(corpus) => {
                let before = corpus.len();
                corpus.retain(|d| d.id() != doc_id);
                corpus.len() != before
            }
            None => false,
        }
    }

    /// Number of documents held for an index.
    pub fn len(&self, index_name: &str) -> usize {
        self.corpora
            .read()
            .get(index_name)
            .map_or(0, |corpus| corpus.len())
    }

    /// Check whether an index's corpus is empty.
    pub fn is_empty(&self, index_name: &str) -> bool {
        self.len(index_name) == 0
    }
}

impl DocumentStore for MemoryStore {
    fn execute(
        &self,
        index: &SearchIndex,
        query: &CompiledQuery,
        deadline: Option<Instant>,
    ) -> Result<Vec<ScoredDocument>> {
        check_deadline(index, deadline)?;

        let corpora = self.corpora.read();
        let corpus = match corpora.get(index.name()) {
            Some(corpus) => corpus,
            None => return Ok(Vec::new()),
        };

        let matches: Vec<ScoredDocument> = corpus
            .par_iter()
            .filter(|doc| query.predicate.matches(doc))
            .filter_map(|doc| match &query.text {
                Some(plan) => {
                    let score = text_score(doc, plan);
                    (score > 0.0).then(|| ScoredDocument {
                        doc: doc.clone(),
                        score,
                    })
                }
                None => Some(ScoredDocument {
                    doc: doc.clone(),
                    score: 1.0,
                }),
            })
            .collect();

        check_deadline(index, deadline)?;
        Ok(matches)
    }
}

fn check_deadline(index: &SearchIndex, deadline: Option<Instant>) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() > deadline => Err(SearchError::timeout(format!(
            "search on index '{}' exceeded its deadline",
            index.name()
        ))),
        _ => Ok(()),
    }
}
