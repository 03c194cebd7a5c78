//! Integrity Error Types
//!
//! This module defines [`IntegrityError`], the error type returned by the integrity engine.
//!
//! Only caller bugs surface here. Missing submission text is a scoring policy, not an error,
//! and failed external lookups are absorbed by the evaluator (see [`crate::traits::lookup::LookupError`]).
//!
//! # Example
//!
//! ```rust
//! use integrity::error::IntegrityError;
//!
//! fn check_threshold(threshold: f64) -> Result<(), IntegrityError> {
//!     if !(0.0..=100.0).contains(&threshold) {
//!         return Err(IntegrityError::InvalidThreshold(threshold));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_threshold(40.0).is_ok());
//! assert!(check_threshold(140.0).is_err());
//! ```

/// Contract violations detected before any scoring happens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityError {
    /// Two input submissions share the same id.
    #[error("Duplicate submission id in input: {0}")]
    DuplicateSubmission(String),

    /// A selected submission id is not part of the assignment's submission set.
    #[error("Submission id not found in input: {0}")]
    UnknownSubmission(String),

    /// Threshold is not a finite percentage in `[0, 100]`.
    #[error("Invalid plagiarism threshold: {0} (expected a percentage between 0 and 100)")]
    InvalidThreshold(f64),
}
