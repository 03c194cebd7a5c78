//! Bag-of-words normalization used by every similarity measure in the engine.

use std::collections::HashSet;

/// Lower-cases `text` and splits it on whitespace into a token set.
///
/// No stemming and no stop-word removal. Non-ASCII tokens are kept as-is after
/// Unicode lower-casing. Empty or whitespace-only input yields the empty set.
pub fn normalize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Same as [`normalize`], treating absent text as empty.
pub fn normalize_opt(text: Option<&str>) -> HashSet<String> {
    text.map(normalize).unwrap_or_default()
}
