//!
//! Traits Module
//!
//! Core traits at the seams of the integrity engine.
//!
//! - [`lookup`]: Defines the external source lookup boundary used by the evaluator.

pub mod lookup;
