//! Scoring policy shared by every external lookup.

use crate::query::take_chars;
use integrity::scorer::similarity;
use util::config::AppConfig;

/// Snippets attached to a [`integrity::SourceMatch`] are cut to this many characters.
pub const SNIPPET_CHARS: usize = 200;

/// How candidate documents are scored and filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPolicy {
    /// Maximum matches a lookup returns.
    pub max_results: usize,
    /// Candidates at or below this Jaccard similarity (0-1) are dropped.
    pub min_similarity: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            max_results: 5,
            min_similarity: 0.1,
        }
    }
}

impl MatchPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_results: config.source_max_results,
            min_similarity: config.source_min_similarity,
        }
    }

    /// Similarity of `candidate` to `text` as a percentage rounded to 2 decimals,
    /// or `None` when it does not clear `min_similarity`.
    pub fn score(&self, text: &str, candidate: &str) -> Option<f64> {
        let s = similarity(text, candidate);
        (s > self.min_similarity).then(|| (s * 10_000.0).round_ties_even() / 100.0)
    }
}

/// Cuts `s` to [`SNIPPET_CHARS`] characters.
pub fn snippet(s: &str) -> String {
    take_chars(s, SNIPPET_CHARS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_filters_weak_candidates() {
        let policy = MatchPolicy::default();
        assert_eq!(policy.score("a b c d e f g h i j", "a x y z"), None);
        assert_eq!(policy.score("the cat sat", "The Cat Sat"), Some(100.0));
        assert_eq!(policy.score("one two three", "one two four"), Some(50.0));
    }

    #[test]
    fn score_threshold_is_exclusive() {
        let policy = MatchPolicy {
            max_results: 5,
            min_similarity: 0.5,
        };
        assert_eq!(policy.score("one two three", "one two four"), None);
    }

    #[test]
    fn score_rounds_exact_halves_to_even() {
        let policy = MatchPolicy {
            max_results: 5,
            min_similarity: 0.01,
        };
        let text = (1..=15).map(|i| format!("a{i}")).collect::<Vec<_>>().join(" ") + " shared";
        let candidate = (1..=16).map(|i| format!("b{i}")).collect::<Vec<_>>().join(" ") + " shared";
        assert_eq!(policy.score(&text, &candidate), Some(3.12));
    }

    #[test]
    fn snippet_is_bounded() {
        assert_eq!(snippet(&"x".repeat(500)).len(), 200);
        assert_eq!(snippet("short"), "short");
    }
}
