//! # Scorer Module
//!
//! Pairwise Jaccard similarity between submission texts and the reductions built on it:
//!
//! - [`similarity`]: symmetric overlap of two texts, in `[0, 1]`.
//! - [`best_match`]: strongest candidate for a target, excluding the target itself.
//! - [`SimilarityMatrix`]: every unordered pair of a submission set, computed once.
//!
//! Ties always resolve to the first maximum in iteration order, so callers that need
//! reproducible `best_id`s must supply candidates in a stable order.

use crate::normalizer::normalize;
use crate::types::BestMatch;
use std::collections::HashSet;

/// Jaccard similarity of two token sets: `|a ∩ b| / |a ∪ b|`.
///
/// Returns `0.0` when the union is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Jaccard similarity of two texts after normalization.
///
/// # Example
///
/// ```
/// use integrity::scorer::similarity;
///
/// assert_eq!(similarity("the cat sat", "The Cat sat"), 1.0);
/// assert_eq!(similarity("", ""), 0.0);
/// assert_eq!(similarity("a b", "b c"), 1.0 / 3.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    jaccard(&normalize(a), &normalize(b))
}

/// Finds the candidate most similar to `target`.
///
/// Candidates whose id equals `exclude_id` are skipped. When no candidate is eligible
/// the sentinel [`BestMatch::none`] is returned.
pub fn best_match<'a, I>(target: &str, candidates: I, exclude_id: Option<&str>) -> BestMatch
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let target_tokens = normalize(target);
    let mut best: Option<(&'a str, f64)> = None;

    for (id, text) in candidates {
        if exclude_id == Some(id) {
            continue;
        }
        let score = jaccard(&target_tokens, &normalize(text));
        if best.is_none_or(|(_, current)| score > current) {
            best = Some((id, score));
        }
    }

    match best {
        Some((id, score)) => BestMatch {
            best_id: Some(id.to_string()),
            score,
        },
        None => BestMatch::none(),
    }
}

/// Symmetric similarity matrix over a fixed, ordered set of texts.
///
/// Each text is normalized once and each unordered pair is scored once.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    ids: Vec<String>,
    scores: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    /// Builds the matrix from `(id, text)` entries, preserving their order.
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (ids, token_sets): (Vec<String>, Vec<HashSet<String>>) = entries
            .into_iter()
            .map(|(id, text)| (id.to_string(), normalize(text)))
            .unzip();

        let n = ids.len();
        let mut scores = vec![vec![0.0; n]; n];
        for i in 0..n {
            scores[i][i] = jaccard(&token_sets[i], &token_sets[i]);
            for j in (i + 1)..n {
                let s = jaccard(&token_sets[i], &token_sets[j]);
                scores[i][j] = s;
                scores[j][i] = s;
            }
        }

        Self { ids, scores }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Similarity between entries `i` and `j`, or `None` if either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.scores.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Best match for entry `index` among all other entries.
    pub fn row_best(&self, index: usize) -> BestMatch {
        let Some(row) = self.scores.get(index) else {
            return BestMatch::none();
        };

        let mut best: Option<(usize, f64)> = None;
        for (j, &score) in row.iter().enumerate() {
            if j == index {
                continue;
            }
            if best.is_none_or(|(_, current)| score > current) {
                best = Some((j, score));
            }
        }

        match best {
            Some((j, score)) => BestMatch {
                best_id: Some(self.ids[j].clone()),
                score,
            },
            None => BestMatch::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "the cat sat on the mat",
        "the cat sat on the mat today",
        "machine learning is great",
        "MACHINE learning   is\tgreat",
        "cooking pasta requires water",
        "数据 科学 data",
    ];

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        for a in SAMPLES {
            for b in SAMPLES {
                let ab = similarity(a, b);
                assert_eq!(ab, similarity(b, a), "asymmetric for {a:?} / {b:?}");
                assert!((0.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("", "anything"), 0.0);
        assert_eq!(similarity("anything", "   "), 0.0);
    }

    #[test]
    fn self_similarity_is_one() {
        for x in SAMPLES.iter().filter(|s| !s.is_empty()) {
            assert_eq!(similarity(x, x), 1.0);
        }
    }

    #[test]
    fn partial_overlap() {
        let s = similarity("the cat sat on the mat", "the cat sat on the mat today");
        assert!((s - 5.0 / 6.0).abs() < 1e-12);
        assert_eq!(similarity("machine learning", "cooking pasta"), 0.0);
    }

    #[test]
    fn best_match_excludes_self_and_takes_first_maximum() {
        let candidates = [
            ("a", "machine learning is great"),
            ("b", "machine learning is great"),
            ("c", "machine learning is great"),
            ("d", "cooking pasta"),
        ];
        let best = best_match("machine learning is great", candidates, Some("a"));
        assert_eq!(best.best_id.as_deref(), Some("b"));
        assert_eq!(best.score, 1.0);
    }

    #[test]
    fn best_match_sentinel_when_nothing_eligible() {
        let best = best_match("text", std::iter::empty(), None);
        assert_eq!(best, BestMatch::none());

        let only_self = [("a", "text")];
        assert_eq!(best_match("text", only_self, Some("a")), BestMatch::none());
    }

    #[test]
    fn best_match_reports_first_candidate_when_all_zero() {
        let candidates = [("x", "alpha"), ("y", "beta")];
        let best = best_match("gamma", candidates, None);
        assert_eq!(best.best_id.as_deref(), Some("x"));
        assert_eq!(best.score, 0.0);
    }

    #[test]
    fn matrix_agrees_with_best_match() {
        let entries = [
            ("1", "the cat sat on the mat"),
            ("2", "the cat sat on the mat today"),
            ("3", "cooking pasta requires water"),
            ("4", "the dog sat"),
        ];
        let matrix = SimilarityMatrix::build(entries);
        assert_eq!(matrix.len(), 4);

        for (i, (id, text)) in entries.iter().enumerate() {
            assert_eq!(matrix.row_best(i), best_match(text, entries, Some(*id)));
        }
    }

    #[test]
    fn matrix_is_symmetric() {
        let entries = [("a", "one two three"), ("b", "two three four"), ("c", "five")];
        let matrix = SimilarityMatrix::build(entries);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert_eq!(matrix.get(0, 1), Some(0.5));
        assert_eq!(matrix.get(3, 0), None);
    }

    #[test]
    fn single_entry_matrix_has_no_match() {
        let matrix = SimilarityMatrix::build([("solo", "only text here")]);
        assert_eq!(matrix.row_best(0), BestMatch::none());
        assert_eq!(matrix.row_best(7), BestMatch::none());
    }
}
