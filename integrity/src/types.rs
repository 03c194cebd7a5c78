//! # Types Module
//!
//! Core data structures shared by the normalizer, scorer and evaluator.

use serde::{Deserialize, Serialize};

/// A grade attached to a submission before the integrity pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// Total score awarded.
    pub score: f64,
    /// Explanation for the grade.
    pub reason: String,
}

impl Grade {
    pub fn new(score: f64, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
        }
    }
}

/// One submission under evaluation.
///
/// Text that could not be fetched or extracted is represented by an empty `raw_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionText {
    /// Opaque identifier, unique within an assignment.
    pub submission_id: String,
    /// Extracted submission text.
    #[serde(default)]
    pub raw_text: String,
    /// Grade produced before the integrity pass, if any.
    #[serde(default)]
    pub existing_grade: Option<Grade>,
}

impl SubmissionText {
    pub fn new(submission_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            submission_id: submission_id.into(),
            raw_text: raw_text.into(),
            existing_grade: None,
        }
    }

    pub fn with_grade(mut self, grade: Grade) -> Self {
        self.existing_grade = Some(grade);
        self
    }

    /// Whether the submission carries any extractable content.
    pub fn has_text(&self) -> bool {
        !self.raw_text.trim().is_empty()
    }
}

/// An external document judged similar to a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMatch {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Similarity on a 0-100 scale.
    pub similarity: f64,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Result of a best-match reduction over a candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    /// Candidate achieving the best score, `None` when there were no eligible candidates.
    pub best_id: Option<String>,
    /// Best Jaccard similarity in `[0, 1]`.
    pub score: f64,
}

impl BestMatch {
    /// The "no eligible candidates" sentinel.
    pub fn none() -> Self {
        Self {
            best_id: None,
            score: 0.0,
        }
    }
}

/// Per-submission result of an integrity pass, ready for persistence by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityOutcome {
    pub submission_id: String,
    /// Strongest similarity signal found, 0-100, rounded to 2 decimals.
    pub plagiarism_score: f64,
    /// Peer submission behind the internal signal, when it scored above zero.
    pub matched_submission: Option<String>,
    pub final_grade: Option<f64>,
    pub final_reason: Option<String>,
    /// The grade as it was before the integrity pass.
    pub original_grade: Option<Grade>,
    /// `true` when the threshold policy replaced the grade.
    pub overridden: bool,
    pub web_sources: Vec<SourceMatch>,
    pub academic_sources: Vec<SourceMatch>,
}
