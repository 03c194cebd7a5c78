//! Command-line grading runner for the integrity engine.
//!
//! Loads an assignment's submissions, wires the configured source lookups into an
//! [`integrity::Evaluator`] and produces an [`integrity::report::IntegrityReport`].

pub mod extract;
pub mod intake;
pub mod run;

pub use run::{RunOptions, build_lookups, run, save_json};
