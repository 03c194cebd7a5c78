//! External source lookups for the integrity engine.
//!
//! Each lookup implements [`integrity::SourceLookup`]:
//! - [`web::WebSearch`]: SerpAPI with a DuckDuckGo HTML fallback.
//! - [`academic::AcademicSearch`]: a vector-search knowledge base.
//! - [`corpus::LocalCorpus`]: a directory of reference documents, searched offline.
//!
//! Lookups only return candidates; the evaluator decides what they mean for the grade.

pub mod academic;
pub mod corpus;
pub mod matching;
pub mod query;
pub mod web;

pub use academic::AcademicSearch;
pub use corpus::LocalCorpus;
pub use matching::MatchPolicy;
pub use web::WebSearch;
