//! Text highlighting for search results.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::compiler::TextPlan;
use crate::document::{Document, FieldValue};

/// Configuration for highlighting.
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// HTML tag to wrap highlighted terms (e.g., "mark", "em", "strong").
    pub tag: String,
    /// Maximum number of fragments to return per field.
    pub max_fragments: usize,
    /// Number of words of context kept on each side of a match.
    pub context_words: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            tag: "mark".to_string(),
            max_fragments: 3,
            context_words: 5,
        }
    }
}

impl HighlightConfig {
    fn opening_tag(&self) -> String {
        format!("<{}>", self.tag)
    }

    fn closing_tag(&self) -> String {
        format!("</{}>", self.tag)
    }
}

/// Highlight information for one field of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightResult {
    /// The field the fragments come from.
    pub field: String,
    /// Fragments with matched words wrapped in the configured tag.
    pub fragments: Vec<String>,
    /// Matched-word count weighted by the field's effective boost.
    pub score: f32,
}

/// Extracts highlighted fragments from matched documents.
#[derive(Debug, Default)]
pub struct Highlighter {
    config: HighlightConfig,
}

impl Highlighter {
    /// Create a highlighter with default configuration.
    pub fn new() -> Self {
        Highlighter {
            config: HighlightConfig::default(),
        }
    }

    /// Create a highlighter with custom configuration.
    pub fn with_config(config: HighlightConfig) -> Self {
        Highlighter { config }
    }

    /// Highlight one document against the query's text plan.
    ///
    /// Returns one [`HighlightResult`] per searchable field that contains
    /// at least one matching word. Fields without matches are omitted.
    pub fn highlight(&self, doc: &Document, plan: &TextPlan) -> Vec<HighlightResult> {
        let mut results = Vec::new();

        for (field, boost) in &plan.fields {
            let texts: Vec<&str> = match doc.get_field(field) {
                Some(FieldValue::Text(text)) => vec![text.as_str()],
                Some(FieldValue::Array(elements)) => {
                    elements.iter().filter_map(|v| v.as_text()).collect()
                }
                _ => continue,
            };

            let mut fragments = Vec::new();
            let mut matched_words = 0usize;
            for text in texts {
                matched_words += self.collect_fragments(text, plan, &mut fragments);
            }

            if matched_words > 0 {
                fragments.truncate(self.config.max_fragments);
                results.push(HighlightResult {
                    field: field.clone(),
                    fragments,
                    score: matched_words as f32 * boost,
                });
            }
        }

        results
    }

    /// Append fragments for one text value, returning the matched-word
    /// count.
    fn collect_fragments(
        &self,
        text: &str,
        plan: &TextPlan,
        fragments: &mut Vec<String>,
    ) -> usize {
        let words: Vec<(usize, &str)> = text.unicode_word_indices().collect();
        let matched: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, (_, word))| plan.matches_token(&word.to_lowercase()))
            .map(|(i, _)| i)
            .collect();

        if matched.is_empty() {
            return 0;
        }

        let mut covered_until = 0usize;
        for &index in &matched {
            if fragments.len() >= self.config.max_fragments {
                break;
            }
            if index < covered_until {
                continue;
            }
            let lo = index.saturating_sub(self.config.context_words);
            let hi = (index + self.config.context_words).min(words.len() - 1);
            fragments.push(self.render_fragment(text, &words, &matched, lo, hi));
            covered_until = hi + 1;
        }

        matched.len()
    }

    /// Rebuild the text between two word positions, wrapping matches.
    fn render_fragment(
        &self,
        text: &str,
        words: &[(usize, &str)],
        matched: &[usize],
        lo: usize,
        hi: usize,
    ) -> String {
        let mut fragment = String::new();
        let mut cursor = words[lo].0;
        for (i, (offset, word)) in words.iter().enumerate().take(hi + 1).skip(lo) {
            fragment.push_str(&text[cursor..*offset]);
            if matched.contains(&i) {
                fragment.push_str(&self.config.opening_tag());
                fragment.push_str(word);
                fragment.push_str(&self.config.closing_tag());
            } else {
                fragment.push_str(word);
            }
            cursor = offset + word.len();
        }
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(terms: &[&str], fuzzy: bool) -> TextPlan {
        TextPlan {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            fields: vec![("title".to_string(), 2.0), ("body".to_string(), 1.0)],
            fuzzy,
        }
    }

    fn article() -> Document {
        Document::builder("a1")
            .text("title", "Faceted search in practice")
            .text(
                "body",
                "A search engine compiles filters into predicates before the search runs",
            )
            .build()
    }

    #[test]
    fn test_highlight_marks_matches() {
        let results = Highlighter::new().highlight(&article(), &plan(&["search"], false));

        assert_eq!(results.len(), 2);
        let title = results.iter().find(|r| r.field == "title").unwrap();
        assert_eq!(title.fragments.len(), 1);
        assert!(title.fragments[0].contains("<mark>search</mark>"));
        // One match in a 2.0-boosted field
        assert_eq!(title.score, 2.0);

        let body = results.iter().find(|r| r.field == "body").unwrap();
        // Both occurrences counted
        assert_eq!(body.score, 2.0);
    }

    #[test]
    fn test_highlight_is_case_insensitive() {
        let doc = Document::builder("a1").text("title", "Search Engines").build();
        let results = Highlighter::new().highlight(&doc, &plan(&["search"], false));

        assert_eq!(results.len(), 1);
        assert!(results[0].fragments[0].contains("<mark>Search</mark>"));
    }

    #[test]
    fn test_no_match_no_result() {
        let results = Highlighter::new().highlight(&article(), &plan(&["quantum"], false));
        assert!(results.is_empty());
    }

    #[test]
    fn test_fuzzy_highlighting() {
        let results = Highlighter::new().highlight(&article(), &plan(&["serch"], true));
        assert!(!results.is_empty());
    }

    #[test]
    fn test_fragment_window_bounds() {
        let long_body: String = (0..40).map(|i| format!("word{i} ")).collect();
        let doc = Document::builder("a1")
            .text("body", format!("{long_body}target {long_body}"))
            .build();

        let plan = TextPlan {
            terms: vec!["target".to_string()],
            fields: vec![("body".to_string(), 1.0)],
            fuzzy: false,
        };
        let results = Highlighter::new().highlight(&doc, &plan);

        assert_eq!(results.len(), 1);
        let fragment = &results[0].fragments[0];
        assert!(fragment.contains("<mark>target</mark>"));
        // The window keeps a handful of context words, not the whole text
        assert!(fragment.len() < doc.get_field("body").unwrap().as_text().unwrap().len());
    }

    #[test]
    fn test_custom_tag() {
        let highlighter = Highlighter::with_config(HighlightConfig {
            tag: "em".to_string(),
            ..Default::default()
        });
        let results = highlighter.highlight(&article(), &plan(&["search"], false));
        assert!(results[0].fragments[0].contains("<em>search</em>"));
    }
}
