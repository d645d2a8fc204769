//! Diagnosis orchestrator
//!
//! Runs the finding producers and merges their output into one report:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  1. Static findings (always)                        │
//! │  2. Secret scan (always)                            │
//! │  3. AI review (enabled + credential + reviewer)     │
//! │  4. Relativize paths                                │
//! │  5. Deduplicate (until stable)                      │
//! │  6. Sort: severity, file, line                      │
//! │  7. Assign ids CD-001..                             │
//! │  8. Count, score, summarize                         │
//! └─────────────────────────────────────────────────────┘
//! ```

use super::score::{health_label, health_score, round_score};
use super::secrets::scan_for_secrets;
use super::static_findings::generate_static_findings;
use crate::ai::{prioritize_functions, review_functions, Reviewer};
use crate::analyzers::AnalysisReport;
use crate::config::ProjectConfig;
use crate::models::{DiagnosisReport, Finding, FindingSource, Severity};
use std::cmp::Reverse;
use std::path::Path;
use tracing::{debug, info, warn};

pub const FINDING_ID_PREFIX: &str = "CD";

/// Findings on the same file and category this close together are merged
const DEDUP_LINE_WINDOW: u32 = 3;

pub struct DiagnosisEngine<'a> {
    root: &'a Path,
    config: &'a ProjectConfig,
    reviewer: Option<&'a dyn Reviewer>,
}

impl<'a> DiagnosisEngine<'a> {
    pub fn new(root: &'a Path, config: &'a ProjectConfig) -> Self {
        Self {
            root,
            config,
            reviewer: None,
        }
    }

    pub fn with_reviewer(mut self, reviewer: &'a dyn Reviewer) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub fn diagnose(&self, analysis: &AnalysisReport) -> DiagnosisReport {
        let mut findings = generate_static_findings(analysis, &self.config.thresholds);
        info!("Static analysis: {} findings", findings.len());

        let security = scan_for_secrets(self.root);
        info!("Secret scan: {} findings", security.len());
        findings.extend(security);

        let (ai_findings, ai_tokens, functions_analyzed) = self.run_ai_review(analysis);
        findings.extend(ai_findings);

        relativize_paths(&mut findings, self.root);
        let mut findings = deduplicate(findings);
        sort_findings(&mut findings);
        assign_ids(&mut findings);

        build_report(findings, analysis.estimated_coverage, ai_tokens, functions_analyzed)
    }

    /// AI stage. Never fails the run: any error or panic yields no findings.
    fn run_ai_review(&self, analysis: &AnalysisReport) -> (Vec<Finding>, u64, usize) {
        let Some(reviewer) = self.reviewer else {
            debug!("No reviewer configured, skipping AI review");
            return (Vec::new(), 0, 0);
        };
        if !self.config.ai.is_active() {
            debug!("AI review disabled or no credential, skipping");
            return (Vec::new(), 0, 0);
        }

        let stage = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let candidates = prioritize_functions(analysis);
            review_functions(
                reviewer,
                &candidates,
                &analysis.modules,
                self.root,
                &self.config.ai,
            )
        }));

        match stage {
            Ok(Ok(outcome)) => (outcome.findings, outcome.tokens_used, outcome.functions_reviewed),
            Ok(Err(e)) => {
                warn!("AI review failed, continuing with static findings: {}", e);
                (Vec::new(), 0, 0)
            }
            Err(_) => {
                warn!("AI review panicked, continuing with static findings");
                (Vec::new(), 0, 0)
            }
        }
    }
}

/// Make absolute paths under `root` relative to it
pub fn relativize_paths(findings: &mut [Finding], root: &Path) {
    for finding in findings.iter_mut() {
        if let Ok(rel) = finding.file_path.strip_prefix(root) {
            finding.file_path = rel.to_path_buf();
        }
    }
}

fn is_duplicate(kept: &Finding, candidate: &Finding) -> bool {
    candidate.has_location()
        && candidate.file_path == kept.file_path
        && candidate.category == kept.category
        && candidate.line_start.abs_diff(kept.line_start) <= DEDUP_LINE_WINDOW
}

/// Whether `candidate` should replace the representative `kept`
fn supersedes(candidate: &Finding, kept: &Finding) -> bool {
    candidate.confidence > kept.confidence
        || (candidate.confidence == kept.confidence
            && candidate.source == FindingSource::Ai
            && kept.source != FindingSource::Ai)
}

/// Single pairwise pass against the kept representatives
fn dedup_pass(findings: Vec<Finding>) -> (Vec<Finding>, bool) {
    let mut kept: Vec<Finding> = Vec::with_capacity(findings.len());
    let mut merged = false;
    for finding in findings {
        match kept.iter().position(|k| is_duplicate(k, &finding)) {
            Some(i) => {
                merged = true;
                if supersedes(&finding, &kept[i]) {
                    kept[i] = finding;
                }
            }
            None => kept.push(finding),
        }
    }
    (kept, merged)
}

/// Collapse findings on the same file and category within a few lines.
///
/// A replaced representative can move its cluster's line, so passes repeat
/// until one merges nothing; running this on its own output is a no-op.
pub fn deduplicate(mut findings: Vec<Finding>) -> Vec<Finding> {
    loop {
        let (kept, merged) = dedup_pass(findings);
        if !merged {
            return kept;
        }
        findings = kept;
    }
}

/// Critical first, then file path as text, then start line. Stable.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by_cached_key(|f| {
        (
            Reverse(f.severity),
            f.file_path.to_string_lossy().into_owned(),
            f.line_start,
        )
    });
}

pub fn assign_ids(findings: &mut [Finding]) {
    for (i, finding) in findings.iter_mut().enumerate() {
        finding.id = format!("{}-{:03}", FINDING_ID_PREFIX, i + 1);
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// One-line synopsis of a sorted finding list
pub fn summarize(findings: &[Finding], critical: usize, warning: usize, info: usize) -> String {
    let mut parts = Vec::new();
    if critical > 0 {
        parts.push(plural(critical, "critical issue", "critical issues"));
    }
    if warning > 0 {
        parts.push(plural(warning, "warning", "warnings"));
    }
    if info > 0 {
        parts.push(plural(info, "note", "notes"));
    }
    if parts.is_empty() {
        return "No issues found. Codebase looks healthy.".to_string();
    }

    let mut summary = format!("{}.", parts.join(", "));
    if let Some(top) = findings.iter().find(|f| f.severity == Severity::Critical) {
        if top.has_location() && top.line_start > 0 {
            summary.push_str(&format!(
                " Top priority: {} at {}:{}.",
                top.title,
                top.file_path.display(),
                top.line_start
            ));
        }
    }
    summary
}

/// Counts, score and summary over the final finding list
pub fn build_report(
    findings: Vec<Finding>,
    estimated_coverage: f64,
    ai_tokens_used: u64,
    functions_analyzed: usize,
) -> DiagnosisReport {
    let count = |s: Severity| findings.iter().filter(|f| f.severity == s).count();
    let critical_count = count(Severity::Critical);
    let warning_count = count(Severity::Warning);
    let info_count = count(Severity::Info);

    let score = health_score(critical_count, warning_count, info_count, estimated_coverage);
    let summary = summarize(&findings, critical_count, warning_count, info_count);

    DiagnosisReport {
        critical_count,
        warning_count,
        info_count,
        health_score: round_score(score),
        health_label: health_label(score),
        summary,
        ai_tokens_used,
        functions_analyzed,
        findings,
    }
}
