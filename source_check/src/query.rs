//! Search-query construction for external lookups.
//!
//! Search engines do poorly with whole essays, so only the opening of a submission is used:
//! the first 200 characters (500 if the opening is mostly whitespace), whitespace collapsed,
//! and cut to the first sentence when still too long.

use once_cell::sync::Lazy;
use regex::Regex;

const QUERY_CHARS: usize = 200;
const MIN_QUERY_CHARS: usize = 20;
const EXTENDED_QUERY_CHARS: usize = 500;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// First `n` characters of `s` (not bytes).
pub fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Builds the search query for `text`.
pub fn build_search_query(text: &str) -> String {
    let mut query = take_chars(text, QUERY_CHARS).trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        query = take_chars(text, EXTENDED_QUERY_CHARS).trim();
    }

    let query = WHITESPACE.replace_all(query, " ");
    if query.chars().count() > QUERY_CHARS {
        return SENTENCE_END
            .split(query.as_ref())
            .next()
            .unwrap_or(query.as_ref())
            .to_string();
    }
    query.into_owned()
}
