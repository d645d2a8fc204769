//! Bounded-concurrency review of prioritized functions
//!
//! ```text
//! candidates[..max_functions] ──► rayon pool (concurrency) ──► Vec<Result<ReviewReply>>
//!                                                                     │
//!                            findings (confidence >= min) ◄── map_reply ◄┘
//! ```
//!
//! Each request runs under `catch_unwind`; a failing or panicking reviewer
//! only loses the findings for that one function.

use super::context::{build_review_context, ReviewContext};
use super::{ReviewError, ReviewResult};
use crate::config::AiSettings;
use crate::models::{
    Category, Finding, FindingSource, FunctionRecord, Language, ModuleRecord, Severity,
    SuggestedFix,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_TITLE: &str = "Issue found";

/// Everything a reviewer gets to see about one function
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest {
    pub model: String,
    pub qualified_name: String,
    pub language: Language,
    pub source: String,
    pub context: ReviewContext,
}

/// One structured finding as reported by the reviewer
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFinding {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// 1-based line relative to the function's first line
    #[serde(default)]
    pub line_start: Option<i64>,
    #[serde(default)]
    pub fix_description: Option<String>,
    #[serde(default)]
    pub code_before: Option<String>,
    #[serde(default)]
    pub code_after: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReviewReply {
    #[serde(default)]
    pub findings: Vec<RawFinding>,
    #[serde(default)]
    pub tokens_used: u64,
}

/// External reviewer capability
pub trait Reviewer: Send + Sync {
    fn review(&self, request: &ReviewRequest) -> ReviewResult<ReviewReply>;
}

#[derive(Debug, Default)]
pub struct ReviewOutcome {
    pub findings: Vec<Finding>,
    pub tokens_used: u64,
    /// Functions sent for review
    pub functions_reviewed: usize,
    /// Requests that failed or panicked
    pub failures: usize,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Translate a reviewer reply into findings anchored on `func`
pub fn map_reply(reply: &ReviewReply, func: &FunctionRecord) -> Vec<Finding> {
    reply
        .findings
        .iter()
        .map(|raw| {
            let severity = raw
                .severity
                .as_deref()
                .and_then(Severity::parse)
                .unwrap_or(Severity::Info);
            let category = raw
                .category
                .as_deref()
                .and_then(Category::parse)
                .unwrap_or(Category::Bug);

            let line_start = match raw.line_start {
                Some(rel) if rel > 0 => {
                    let abs = func.line_start as i64 + rel - 1;
                    u32::try_from(abs).unwrap_or(func.line_start)
                }
                _ => func.line_start,
            };

            let mut finding = Finding::new(
                FindingSource::Ai,
                severity,
                category,
                non_empty(&raw.title).unwrap_or(DEFAULT_TITLE),
                raw.description.clone().unwrap_or_default(),
            )
            .for_function(func)
            .with_confidence(raw.confidence.unwrap_or(DEFAULT_CONFIDENCE));
            finding.line_start = line_start;
            finding.line_end = func.line_end.max(line_start);

            if non_empty(&raw.fix_description).is_some() || non_empty(&raw.code_after).is_some() {
                finding = finding.with_fix(
                    SuggestedFix::new(raw.fix_description.clone().unwrap_or_default())
                        .with_code(
                            raw.code_before.clone().unwrap_or_default(),
                            raw.code_after.clone().unwrap_or_default(),
                        )
                        .with_explanation(raw.explanation.clone().unwrap_or_default()),
                );
            }
            finding
        })
        .collect()
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn review_one(reviewer: &dyn Reviewer, request: &ReviewRequest) -> ReviewResult<ReviewReply> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| reviewer.review(request))) {
        Ok(result) => result,
        Err(payload) => {
            warn!(
                "Reviewer panicked on {}: {}",
                request.qualified_name,
                panic_message(payload)
            );
            Err(ReviewError::Panicked(request.qualified_name.clone()))
        }
    }
}

/// Review the first `max_functions` candidates on a pool of `concurrency`
/// threads. Results are gathered before mapping, so completion order never
/// affects the output.
pub fn review_functions(
    reviewer: &dyn Reviewer,
    candidates: &[&FunctionRecord],
    modules: &[ModuleRecord],
    root: &Path,
    settings: &AiSettings,
) -> ReviewResult<ReviewOutcome> {
    let selected = &candidates[..candidates.len().min(settings.max_functions)];
    if selected.is_empty() {
        return Ok(ReviewOutcome::default());
    }

    let requests: Vec<ReviewRequest> = selected
        .iter()
        .map(|func| ReviewRequest {
            model: settings.model.clone(),
            qualified_name: func.qualified_name.clone(),
            language: func.language,
            source: func.source.clone(),
            context: build_review_context(func, modules, root),
        })
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.concurrency.max(1))
        .build()?;

    let replies: Vec<ReviewResult<ReviewReply>> = pool.install(|| {
        requests
            .par_iter()
            .map(|request| {
                debug!("Reviewing {}", request.qualified_name);
                review_one(reviewer, request)
            })
            .collect()
    });

    let mut outcome = ReviewOutcome {
        functions_reviewed: selected.len(),
        ..Default::default()
    };
    let mut dropped = 0;
    for (func, reply) in selected.iter().zip(replies) {
        match reply {
            Ok(reply) => {
                outcome.tokens_used += reply.tokens_used;
                for finding in map_reply(&reply, func) {
                    if finding.confidence >= settings.min_confidence {
                        outcome.findings.push(finding);
                    } else {
                        dropped += 1;
                    }
                }
            }
            Err(e) => {
                warn!("AI review failed for {}: {}", func.qualified_name, e);
                outcome.failures += 1;
            }
        }
    }

    info!(
        "AI review: {} findings from {} functions ({} failed, {} below confidence, {} tokens)",
        outcome.findings.len(),
        outcome.functions_reviewed,
        outcome.failures,
        dropped,
        outcome.tokens_used
    );
    Ok(outcome)
}
