//! Search history and popularity statistics.
//!
//! Every executed search is recorded under a generated id, and word-level
//! frequency counters feed "popular searches". Recording never fails: a
//! malformed or empty query degrades to recording nothing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tokens this short are ignored by the frequency counters.
const MIN_TERM_CHARS: usize = 3;

/// One executed search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Generated search id.
    pub id: Uuid,
    /// The free-text query, if any.
    pub query: Option<String>,
    /// Number of top-level filters on the query.
    pub filter_count: usize,
    /// Total matches before pagination.
    pub total_hits: u64,
    /// Wall-clock execution time in milliseconds.
    pub took_ms: u64,
    /// When the search ran.
    pub executed_at: DateTime<Utc>,
}

/// A popular search term with its frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularTerm {
    /// The lowercased term.
    pub term: String,
    /// How many recorded queries contained it.
    pub count: u64,
}

/// Aggregate statistics over all recorded searches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of searches recorded.
    pub total_searches: u64,
    /// Sum of `total_hits` across searches.
    pub total_hits: u64,
    /// Mean execution time in milliseconds.
    pub avg_took_ms: f64,
}

#[derive(Debug)]
struct TermCounter {
    count: u64,
    /// Insertion sequence, for deterministic tie-breaks.
    first_seen: u64,
}

#[derive(Debug, Default)]
struct HistoryInner {
    records: VecDeque<SearchRecord>,
    terms: AHashMap<String, TermCounter>,
    next_seq: u64,
    took_total_ms: u64,
}

/// Tracks executed searches and term popularity.
///
/// Counters are mutated under a mutex so concurrent searches never lose
/// updates; totals use relaxed atomics (popularity ranking tolerates minor
/// skew, per the concurrency model).
#[derive(Debug)]
pub struct SearchHistory {
    inner: Mutex<HistoryInner>,
    capacity: usize,
    total_searches: AtomicU64,
    total_hits: AtomicU64,
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl SearchHistory {
    /// Create a tracker that retains at most `capacity` records (FIFO).
    /// Term counters are not evicted.
    pub fn new(capacity: usize) -> Self {
        SearchHistory {
            inner: Mutex::new(HistoryInner::default()),
            capacity: capacity.max(1),
            total_searches: AtomicU64::new(0),
            total_hits: AtomicU64::new(0),
        }
    }

    /// Record one executed search and return its id.
    pub fn record(
        &self,
        query_text: Option<&str>,
        filter_count: usize,
        total_hits: u64,
        took_ms: u64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let record = SearchRecord {
            id,
            query: query_text.map(|q| q.to_string()),
            filter_count,
            total_hits,
            took_ms,
            executed_at: Utc::now(),
        };

        let mut inner = self.inner.lock();
        if inner.records.len() == self.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(record);
        inner.took_total_ms = inner.took_total_ms.saturating_add(took_ms);

        if let Some(text) = query_text {
            for token in text.split_whitespace() {
                let token = token.to_lowercase();
                if token.chars().count() < MIN_TERM_CHARS {
                    continue;
                }
                let seq = inner.next_seq;
                let counter = inner.terms.entry(token).or_insert_with(|| {
                    TermCounter {
                        count: 0,
                        first_seen: seq,
                    }
                });
                counter.count += 1;
                inner.next_seq += 1;
            }
        }
        drop(inner);

        self.total_searches.fetch_add(1, Ordering::Relaxed);
        self.total_hits.fetch_add(total_hits, Ordering::Relaxed);
        id
    }

    /// The most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<SearchRecord> {
        let inner = self.inner.lock();
        inner.records.iter().rev().take(limit).cloned().collect()
    }

    /// Top terms by frequency; ties break by first-seen order.
    pub fn popular(&self, limit: usize) -> Vec<PopularTerm> {
        let inner = self.inner.lock();
        let mut terms: Vec<(&String, &TermCounter)> = inner.terms.iter().collect();
        terms.sort_by(|(_, a), (_, b)| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        terms
            .into_iter()
            .take(limit)
            .map(|(term, counter)| PopularTerm {
                term: term.clone(),
                count: counter.count,
            })
            .collect()
    }

    /// Aggregate statistics.
    pub fn stats(&self) -> SearchStats {
        let total_searches = self.total_searches.load(Ordering::Relaxed);
        let took_total_ms = self.inner.lock().took_total_ms;
        SearchStats {
            total_searches,
            total_hits: self.total_hits.load(Ordering::Relaxed),
            avg_took_ms: if total_searches == 0 {
                0.0
            } else {
                took_total_ms as f64 / total_searches as f64
            },
        }
    }
}
