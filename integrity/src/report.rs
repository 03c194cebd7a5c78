//! # Integrity Report Module
//!
//! Serializable summary of an integrity pass over one assignment, plus the response envelope
//! used when handing the report to a client.
//!
//! ## JSON Output Example
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "Integrity check complete.",
//!   "data": {
//!     "assignment_id": "...",
//!     "threshold": 40.0,
//!     "flagged": 2,
//!     "outcomes": [ { "submission_id": "...", "plagiarism_score": 100.0, ... } ]
//!   }
//! }
//! ```

use crate::types::IntegrityOutcome;
use serde::Serialize;

/// All outcomes of one grading run.
#[derive(Debug, Serialize)]
pub struct IntegrityReport {
    pub assignment_id: String,
    pub threshold: f64,
    /// Number of outcomes whose grade was overridden.
    pub flagged: usize,
    pub outcomes: Vec<IntegrityOutcome>,
}

impl IntegrityReport {
    pub fn new(assignment_id: impl Into<String>, threshold: f64, outcomes: Vec<IntegrityOutcome>) -> Self {
        let flagged = outcomes.iter().filter(|o| o.overridden).count();
        Self {
            assignment_id: assignment_id.into(),
            threshold,
            flagged,
            outcomes,
        }
    }
}

/// Response envelope wrapping an [`IntegrityReport`].
#[derive(Debug, Serialize)]
pub struct IntegrityReportResponse {
    success: bool,
    message: String,
    data: IntegrityReport,
}

impl From<IntegrityReport> for IntegrityReportResponse {
    fn from(report: IntegrityReport) -> Self {
        IntegrityReportResponse {
            success: true,
            message: "Integrity check complete.".to_string(),
            data: report,
        }
    }
}
