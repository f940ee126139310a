//! Best-effort query suggestions from search history and synonyms.

use ahash::AHashMap;

use crate::history::SearchHistory;
use crate::util::levenshtein::levenshtein_distance_threshold;

/// Configuration for suggestion generation.
#[derive(Debug, Clone)]
pub struct SuggesterConfig {
    /// Maximum number of suggestions to return.
    pub max_suggestions: usize,
    /// Maximum edit distance to a popular term.
    pub max_distance: usize,
    /// How many popular terms to consider as candidates.
    pub candidate_pool: usize,
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        SuggesterConfig {
            max_suggestions: 5,
            max_distance: 2,
            candidate_pool: 100,
        }
    }
}

/// One candidate rewrite of a query token.
#[derive(Debug, Clone)]
struct Candidate {
    token_index: usize,
    replacement: String,
    distance: usize,
    frequency: u64,
}

/// Derives alternate query strings from popular history terms and
/// configured synonyms.
///
/// Suggestions are best-effort: an empty result is always valid and
/// generation never fails the caller's search.
#[derive(Debug, Default)]
pub struct Suggester {
    config: SuggesterConfig,
    synonyms: AHashMap<String, Vec<String>>,
}

impl Suggester {
    /// Create a suggester with default configuration.
    pub fn new() -> Self {
        Suggester {
            config: SuggesterConfig::default(),
            synonyms: AHashMap::new(),
        }
    }

    /// Create a suggester with custom configuration.
    pub fn with_config(config: SuggesterConfig) -> Self {
        Suggester {
            config,
            synonyms: AHashMap::new(),
        }
    }

    /// Register synonym expansions for a term.
    pub fn add_synonyms<S, I, A>(&mut self, term: S, alternatives: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let entry = self.synonyms.entry(term.into().to_lowercase()).or_default();
        for alternative in alternatives {
            let alternative = alternative.into().to_lowercase();
            if !entry.contains(&alternative) {
                entry.push(alternative);
            }
        }
    }

    /// Suggest alternate query strings for `query_text`.
    pub fn suggest(&self, query_text: &str, history: &SearchHistory) -> Vec<String> {
        let tokens: Vec<String> = query_text
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let popular = history.popular(self.config.candidate_pool);
        let mut candidates: Vec<Candidate> = Vec::new();

        for (token_index, token) in tokens.iter().enumerate() {
            // Synonyms first: they apply even to correctly-spelled tokens.
            if let Some(alternatives) = self.synonyms.get(token) {
                for alternative in alternatives {
                    candidates.push(Candidate {
                        token_index,
                        replacement: alternative.clone(),
                        distance: 0,
                        frequency: u64::MAX,
                    });
                }
            }

            // A token that already is a popular term needs no respelling.
            if popular.iter().any(|p| &p.term == token) {
                continue;
            }

            for term in &popular {
                if let Some(distance) =
                    levenshtein_distance_threshold(token, &term.term, self.config.max_distance)
                    && distance > 0
                {
                    candidates.push(Candidate {
                        token_index,
                        replacement: term.term.clone(),
                        distance,
                        frequency: term.count,
                    });
                }
            }
        }

        candidates.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.replacement.cmp(&b.replacement))
        });

        let mut suggestions = Vec::new();
        for candidate in candidates {
            let mut rewritten = tokens.clone();
            rewritten[candidate.token_index] = candidate.replacement;
            let rewritten = rewritten.join(" ");
            if rewritten != query_text.to_lowercase() && !suggestions.contains(&rewritten) {
                suggestions.push(rewritten);
            }
            if suggestions.len() >= self.config.max_suggestions {
                break;
            }
        }
        suggestions
    }
}
