//! Static metric analyzers
//!
//! Each analyzer annotates the ingested records in place. [`AnalysisEngine`]
//! runs them in order and aggregates the result.

pub mod complexity;
pub mod coupling;
pub mod coverage_gap;
pub mod dead_code;
mod engine;

pub use complexity::{branch_token_complexity, ComplexityCounter, ComplexityScorer};
pub use engine::{AnalysisEngine, AnalysisReport};
