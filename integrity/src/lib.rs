//! # Integrity Library
//!
//! Plagiarism detection for graded submissions. Given every submission of an assignment,
//! the engine scores each one against its peers and against external sources, folds the
//! signals into a single plagiarism percentage and zeroes grades above a threshold.
//!
//! ## Key Concepts
//! - **Normalizer**: lower-cased, whitespace-split token sets ([`normalizer`]).
//! - **Scorer**: Jaccard similarity, best-match reduction and the pairwise matrix ([`scorer`]).
//! - **Evaluator**: per-submission pipeline with fail-soft external lookups ([`evaluator`]).
//! - **Lookups**: pluggable external sources behind [`traits::lookup::SourceLookup`].
//! - **Reports**: serializable run summary ([`report`]).
//!
//! The engine performs no I/O of its own beyond calling the injected lookups; persisting
//! outcomes is the caller's job.

pub mod error;
pub mod evaluator;
pub mod normalizer;
pub mod report;
pub mod scorer;
pub mod traits;
pub mod types;

pub use error::IntegrityError;
pub use evaluator::{EvaluationSettings, Evaluator};
pub use traits::lookup::{LookupError, NoSources, SourceLookup};
pub use types::{Grade, IntegrityOutcome, SourceMatch, SubmissionText};
