//! codediag - code-health diagnosis engine
//!
//! Consumes per-file metrics from parser collaborators and produces a
//! prioritized, deduplicated list of findings plus a composite health score.
//!
//! ```text
//! MetricsDocument ──► AnalysisEngine ──► AnalysisReport
//!                                             │
//!          static findings + secret scan + AI review (optional)
//!                                             │
//!                                   DiagnosisEngine ──► DiagnosisReport ──► fixes
//! ```

pub mod ai;
pub mod analyzers;
pub mod cli;
pub mod config;
pub mod diagnosis;
pub mod fixes;
pub mod ingest;
pub mod models;
