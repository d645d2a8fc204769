//! Finding producers and the orchestrator that merges them

mod engine;
pub mod score;
pub mod secrets;
pub mod static_findings;

pub use engine::{
    assign_ids, build_report, deduplicate, relativize_paths, sort_findings, summarize,
    DiagnosisEngine, FINDING_ID_PREFIX,
};
pub use secrets::scan_for_secrets;
pub use static_findings::generate_static_findings;
