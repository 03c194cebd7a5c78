//!
//! # Source Lookup Trait
//!
//! This module defines [`SourceLookup`], the boundary between the integrity engine and
//! external corroborating sources (web search, academic corpora, local reference sets).
//!
//! Lookups are best-effort. The evaluator treats every [`LookupError`], panic or timeout
//! as "no sources found" for that signal only, so an implementation is free to return
//! errors without worrying about the rest of the grading run.
//!

use crate::types::SourceMatch;
use async_trait::async_trait;

/// Failure of a single external lookup call.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Request(String),
    /// The service answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),
    /// The response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),
    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

/// A pluggable source of external matches for a submission's text.
///
/// # Returns
/// - `Ok(Vec<SourceMatch>)`: ranked matches, possibly empty. Similarities use the 0-100 scale.
/// - `Err(LookupError)`: the call failed; the evaluator logs it and carries on without sources.
#[async_trait]
pub trait SourceLookup: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn lookup(&self, text: &str) -> Result<Vec<SourceMatch>, LookupError>;
}

/// Lookup used when a source is not configured. Always finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSources;

#[async_trait]
impl SourceLookup for NoSources {
    fn name(&self) -> &str {
        "none"
    }

    async fn lookup(&self, _text: &str) -> Result<Vec<SourceMatch>, LookupError> {
        Ok(Vec::new())
    }
}
