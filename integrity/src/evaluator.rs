//! # Integrity Evaluator
//!
//! Produces one [`IntegrityOutcome`] per submission of an assignment by combining:
//!
//! - the best Jaccard match against every other submission of the same assignment,
//! - the strongest web source reported by the web lookup,
//! - the strongest academic source reported by the academic lookup.
//!
//! The plagiarism score is the maximum of the three signals on a 0-100 scale, rounded to two
//! decimals. A score strictly above the threshold replaces the grade with `0.0` and records
//! the original grade in the reason.
//!
//! ## Failure handling
//!
//! - Submissions without text score `0.0` and keep their grade. No lookups are made for them.
//! - Lookup errors, panics and timeouts are logged and treated as "no sources" for that signal.
//! - Duplicate ids, unknown selected ids and invalid thresholds are caller bugs and are returned
//!   as [`IntegrityError`] before any work starts.
//!
//! Lookups for one submission run concurrently with each other and with those of other
//! submissions. Outcomes depend only on immutable inputs, so the result is identical to a
//! sequential run and is returned in input order.

use crate::error::IntegrityError;
use crate::scorer::SimilarityMatrix;
use crate::traits::lookup::{NoSources, SourceLookup};
use crate::types::{BestMatch, Grade, IntegrityOutcome, SourceMatch, SubmissionText};
use futures::FutureExt;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use util::config::{AppConfig, DEFAULT_PLAGIARISM_THRESHOLD};

/// Default bound on a single external lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Policy knobs for one evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSettings {
    /// Scores strictly above this percentage zero the grade.
    pub threshold: f64,
    /// Bound on each external lookup call.
    pub lookup_timeout: Duration,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PLAGIARISM_THRESHOLD,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

impl EvaluationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            threshold: config.plagiarism_threshold,
            lookup_timeout: match config.lookup_timeout_secs {
                0 => DEFAULT_LOOKUP_TIMEOUT,
                secs => Duration::from_secs(secs),
            },
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), IntegrityError> {
        if !self.threshold.is_finite() || !(0.0..=100.0).contains(&self.threshold) {
            return Err(IntegrityError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

/// Grade after the threshold policy has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeDecision {
    pub final_grade: Option<f64>,
    pub final_reason: Option<String>,
    pub overridden: bool,
}

/// Round a float to two decimal places.
#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Renders a score the way it appears in grade reasons: whole numbers keep one decimal
/// (`40.0`), everything else prints its shortest form (`83.33`).
pub fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Applies the zero-grade override.
///
/// Above the threshold the grade becomes `0.0` and the reason names the score, the threshold
/// and the original grade (`N/A` when ungraded). Otherwise the existing grade passes through.
pub fn apply_threshold(
    plagiarism_score: f64,
    threshold: f64,
    existing: Option<&Grade>,
) -> GradeDecision {
    if plagiarism_score > threshold {
        let original = existing
            .map(|g| format_score(g.score))
            .unwrap_or_else(|| "N/A".to_string());
        return GradeDecision {
            final_grade: Some(0.0),
            final_reason: Some(format!(
                "Grade set to 0 due to high plagiarism score ({}% similarity, threshold: {}%). Original grade was {}.",
                format_score(plagiarism_score),
                format_score(threshold),
                original
            )),
            overridden: true,
        };
    }

    GradeDecision {
        final_grade: existing.map(|g| g.score),
        final_reason: existing.map(|g| g.reason.clone()),
        overridden: false,
    }
}

/// Maps each submission id to its position, rejecting duplicates.
fn index_by_id(submissions: &[SubmissionText]) -> Result<HashMap<&str, usize>, IntegrityError> {
    let mut index = HashMap::with_capacity(submissions.len());
    for (i, submission) in submissions.iter().enumerate() {
        if index.insert(submission.submission_id.as_str(), i).is_some() {
            return Err(IntegrityError::DuplicateSubmission(
                submission.submission_id.clone(),
            ));
        }
    }
    Ok(index)
}

/// Internal similarity signal for every submission of the assignment.
struct PeerScores {
    matrix: SimilarityMatrix,
    /// Submission position -> matrix row. Only submissions with text have a row.
    rows: HashMap<usize, usize>,
}

impl PeerScores {
    fn build(submissions: &[SubmissionText]) -> Option<Self> {
        let with_text: Vec<usize> = submissions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.has_text())
            .map(|(i, _)| i)
            .collect();

        if with_text.len() < 2 {
            info!(
                "Less than 2 submissions with content ({}) - skipping pairwise comparison",
                with_text.len()
            );
            return None;
        }

        let matrix = SimilarityMatrix::build(with_text.iter().map(|&i| {
            let s = &submissions[i];
            (s.submission_id.as_str(), s.raw_text.as_str())
        }));
        let rows = with_text
            .into_iter()
            .enumerate()
            .map(|(row, i)| (i, row))
            .collect();

        Some(Self { matrix, rows })
    }

    fn best_for(&self, submission_index: usize) -> BestMatch {
        match self.rows.get(&submission_index) {
            Some(&row) => self.matrix.row_best(row),
            None => BestMatch::none(),
        }
    }
}

/// Drops non-finite similarities and clamps the rest to `[0, 100]`.
fn sanitize(sources: Vec<SourceMatch>) -> Vec<SourceMatch> {
    sources
        .into_iter()
        .filter(|s| s.similarity.is_finite())
        .map(|mut s| {
            s.similarity = s.similarity.clamp(0.0, 100.0);
            s
        })
        .collect()
}

fn strongest(sources: &[SourceMatch]) -> f64 {
    sources.iter().map(|s| s.similarity).fold(0.0, f64::max)
}

/// Runs integrity passes for assignments.
///
/// Lookups are injected so tests and offline runs can substitute their own.
pub struct Evaluator {
    web: Arc<dyn SourceLookup>,
    academic: Arc<dyn SourceLookup>,
    settings: EvaluationSettings,
}

impl Evaluator {
    pub fn new(
        web: Arc<dyn SourceLookup>,
        academic: Arc<dyn SourceLookup>,
        settings: EvaluationSettings,
    ) -> Self {
        Self {
            web,
            academic,
            settings,
        }
    }

    /// Evaluator with no external sources: internal similarity only.
    pub fn offline(settings: EvaluationSettings) -> Self {
        Self::new(Arc::new(NoSources), Arc::new(NoSources), settings)
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    /// Evaluates every submission of an assignment.
    ///
    /// # Returns
    /// One outcome per input submission, in input order.
    ///
    /// # Errors
    /// [`IntegrityError::DuplicateSubmission`] or [`IntegrityError::InvalidThreshold`].
    pub async fn evaluate(
        &self,
        submissions: &[SubmissionText],
    ) -> Result<Vec<IntegrityOutcome>, IntegrityError> {
        self.settings.validate()?;
        index_by_id(submissions)?;
        let targets: Vec<usize> = (0..submissions.len()).collect();
        Ok(self.run(submissions, &targets).await)
    }

    /// Evaluates only `selected_ids`, comparing each against all `submissions`.
    ///
    /// Used when a grader only owns part of an assignment's cohort but plagiarism must still
    /// be checked across every submission.
    ///
    /// # Errors
    /// [`IntegrityError::UnknownSubmission`] for an id missing from `submissions`, plus the
    /// errors of [`Evaluator::evaluate`]. A repeated selected id counts as a duplicate.
    pub async fn evaluate_selected(
        &self,
        submissions: &[SubmissionText],
        selected_ids: &[String],
    ) -> Result<Vec<IntegrityOutcome>, IntegrityError> {
        self.settings.validate()?;
        let index = index_by_id(submissions)?;

        let mut seen = HashSet::with_capacity(selected_ids.len());
        let targets = selected_ids
            .iter()
            .map(|id| {
                if !seen.insert(id.as_str()) {
                    return Err(IntegrityError::DuplicateSubmission(id.clone()));
                }
                index
                    .get(id.as_str())
                    .copied()
                    .ok_or_else(|| IntegrityError::UnknownSubmission(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.run(submissions, &targets).await)
    }

    async fn run(&self, submissions: &[SubmissionText], targets: &[usize]) -> Vec<IntegrityOutcome> {
        info!(
            "Starting plagiarism check for {} of {} submission(s), threshold {}%",
            targets.len(),
            submissions.len(),
            format_score(self.settings.threshold)
        );

        let peers = PeerScores::build(submissions);
        let outcomes = join_all(targets.iter().map(|&i| {
            let internal = peers
                .as_ref()
                .map(|p| p.best_for(i))
                .unwrap_or_else(BestMatch::none);
            self.assess(&submissions[i], internal)
        }))
        .await;

        let flagged = outcomes.iter().filter(|o| o.overridden).count();
        info!(
            "Completed plagiarism check: {} submission(s), {} over threshold",
            outcomes.len(),
            flagged
        );
        outcomes
    }

    async fn assess(&self, submission: &SubmissionText, internal: BestMatch) -> IntegrityOutcome {
        let id = submission.submission_id.as_str();
        let existing = submission.existing_grade.as_ref();

        if !submission.has_text() {
            warn!(submission_id = %id, "Submission has no content - plagiarism score set to 0");
            return IntegrityOutcome {
                submission_id: id.to_string(),
                plagiarism_score: 0.0,
                matched_submission: None,
                final_grade: existing.map(|g| g.score),
                final_reason: existing.map(|g| g.reason.clone()),
                original_grade: existing.cloned(),
                overridden: false,
                web_sources: Vec::new(),
                academic_sources: Vec::new(),
            };
        }

        let internal_score = round2(internal.score * 100.0);
        debug!(submission_id = %id, "Max peer similarity: {}%", internal_score);

        let text = submission.raw_text.as_str();
        let (web_sources, academic_sources) = tokio::join!(
            self.guarded_lookup(self.web.as_ref(), id, text),
            self.guarded_lookup(self.academic.as_ref(), id, text),
        );
        info!(
            submission_id = %id,
            "Source check summary: {} web source(s), {} academic source(s)",
            web_sources.len(),
            academic_sources.len()
        );

        let plagiarism_score = round2(
            internal_score
                .max(strongest(&web_sources))
                .max(strongest(&academic_sources)),
        );

        let decision = apply_threshold(plagiarism_score, self.settings.threshold, existing);
        if decision.overridden {
            warn!(
                submission_id = %id,
                "Plagiarism {}% exceeds threshold {}% - setting grade to 0",
                format_score(plagiarism_score),
                format_score(self.settings.threshold)
            );
        } else {
            info!(
                submission_id = %id,
                "Plagiarism {}% is within threshold - keeping original grade",
                format_score(plagiarism_score)
            );
        }

        IntegrityOutcome {
            submission_id: id.to_string(),
            plagiarism_score,
            matched_submission: if internal.score > 0.0 {
                internal.best_id
            } else {
                None
            },
            final_grade: decision.final_grade,
            final_reason: decision.final_reason,
            original_grade: existing.cloned(),
            overridden: decision.overridden,
            web_sources,
            academic_sources,
        }
    }

    /// Calls one lookup, absorbing errors, panics and timeouts.
    async fn guarded_lookup(
        &self,
        lookup: &dyn SourceLookup,
        submission_id: &str,
        text: &str,
    ) -> Vec<SourceMatch> {
        let call = AssertUnwindSafe(lookup.lookup(text)).catch_unwind();
        match tokio::time::timeout(self.settings.lookup_timeout, call).await {
            Ok(Ok(Ok(sources))) => sanitize(sources),
            Ok(Ok(Err(e))) => {
                warn!(
                    submission_id = %submission_id,
                    lookup = lookup.name(),
                    "Source lookup failed, continuing without it: {e}"
                );
                Vec::new()
            }
            Ok(Err(_)) => {
                error!(
                    submission_id = %submission_id,
                    lookup = lookup.name(),
                    "Source lookup panicked, continuing without it"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    submission_id = %submission_id,
                    lookup = lookup.name(),
                    "Source lookup timed out after {:?}, continuing without it",
                    self.settings.lookup_timeout
                );
                Vec::new()
            }
        }
    }
}
