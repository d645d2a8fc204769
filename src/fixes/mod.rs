//! Auto-fix applier
//!
//! Applies the before/after snippets of suggested fixes to files on disk.
//! Only the first occurrence starting within the finding's lines is replaced,
//! so a fix that was already applied is reported as "pattern not found"
//! rather than moved on to a later copy of the same snippet.
//!
//! Each finding ends up in exactly one bucket:
//! - applied: the file was (or, in a dry run, would be) changed
//! - skipped: nothing to apply (no usable fix, no path, no match, no change)
//! - failed: an IO problem (missing file, read or write error)

use crate::models::Finding;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Why a fix was not applied, without any IO failure involved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    NoApplicableFix,
    NoFilePath,
    PatternNotFound,
    NoChange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoApplicableFix => write!(f, "no applicable fix (missing code_before or code_after)"),
            SkipReason::NoFilePath => write!(f, "no file path"),
            SkipReason::PatternNotFound => write!(f, "code_before not found in file (possibly already fixed)"),
            SkipReason::NoChange => write!(f, "replacement produced no change"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FixError {
    #[error("File not found: {0}")]
    FileMissing(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct FixResult {
    pub finding_id: String,
    pub file_path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct AutoFixReport {
    pub applied: Vec<FixResult>,
    pub skipped: Vec<FixResult>,
    pub failed: Vec<FixResult>,
}

impl AutoFixReport {
    pub fn total(&self) -> usize {
        self.applied.len() + self.skipped.len() + self.failed.len()
    }
}

enum FixOutcome {
    Applied(String),
    Skipped(SkipReason),
    Failed(FixError),
}

/// Lines a fix's snippet may start on. A finding without a line is unanchored.
fn anchor_lines(finding: &Finding) -> Option<RangeInclusive<u32>> {
    (finding.line_start > 0)
        .then(|| finding.line_start..=finding.line_end.max(finding.line_start))
}

fn line_at(content: &str, offset: usize) -> u32 {
    content[..offset].matches('\n').count() as u32 + 1
}

/// Replace the first occurrence of `before` that starts on one of `lines`.
///
/// Tries the literal snippet, then the whitespace-trimmed snippet. Returns
/// `None` when neither occurs there, or when that spot already holds the
/// applied replacement.
fn replace_first(
    content: &str,
    before: &str,
    after: &str,
    lines: Option<&RangeInclusive<u32>>,
) -> Option<String> {
    let candidates = [(before, after), (before.trim(), after.trim())];
    for (pattern, replacement) in candidates {
        if pattern.is_empty() {
            continue;
        }
        let Some(at) = content
            .match_indices(pattern)
            .map(|(i, _)| i)
            .find(|&i| lines.map_or(true, |r| r.contains(&line_at(content, i))))
        else {
            continue;
        };
        if let Some(k) = replacement.find(pattern) {
            let applied = at
                .checked_sub(k)
                .and_then(|start| content.get(start..))
                .is_some_and(|rest| rest.starts_with(replacement));
            if applied {
                return None;
            }
        }
        let mut out = String::with_capacity(content.len() + replacement.len());
        out.push_str(&content[..at]);
        out.push_str(replacement);
        out.push_str(&content[at + pattern.len()..]);
        return Some(out);
    }
    None
}

fn apply_one(finding: &Finding, root: &Path, dry_run: bool) -> FixOutcome {
    let Some(fix) = finding.suggested_fix.as_ref().filter(|f| f.is_applicable()) else {
        return FixOutcome::Skipped(SkipReason::NoApplicableFix);
    };
    if !finding.has_location() {
        return FixOutcome::Skipped(SkipReason::NoFilePath);
    }

    let path = root.join(&finding.file_path);
    if !path.is_file() {
        return FixOutcome::Failed(FixError::FileMissing(finding.file_path.clone()));
    }
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(source) => return FixOutcome::Failed(FixError::Read { path, source }),
    };

    let Some(new_content) = replace_first(
        &content,
        &fix.code_before,
        &fix.code_after,
        anchor_lines(finding).as_ref(),
    ) else {
        return FixOutcome::Skipped(SkipReason::PatternNotFound);
    };
    if new_content == content {
        return FixOutcome::Skipped(SkipReason::NoChange);
    }

    if dry_run {
        return FixOutcome::Applied(format!("[dry-run] would apply: {}", fix.description));
    }
    if let Err(source) = fs::write(&path, new_content) {
        return FixOutcome::Failed(FixError::Write { path, source });
    }
    info!("Applied fix {} to {}", finding.id, finding.file_path.display());
    FixOutcome::Applied(format!("applied: {}", fix.description))
}

/// Apply every finding's suggested fix under `root`. Never aborts early.
pub fn apply_fixes(findings: &[Finding], root: &Path, dry_run: bool) -> AutoFixReport {
    let mut report = AutoFixReport::default();

    for finding in findings {
        let result = |message: String| FixResult {
            finding_id: finding.id.clone(),
            file_path: finding.file_path.clone(),
            message,
        };
        match apply_one(finding, root, dry_run) {
            FixOutcome::Applied(message) => report.applied.push(result(message)),
            FixOutcome::Skipped(reason) => {
                debug!("Skipped fix {}: {}", finding.id, reason);
                report.skipped.push(result(reason.to_string()));
            }
            FixOutcome::Failed(e) => {
                debug!("Fix {} failed: {}", finding.id, e);
                report.failed.push(result(e.to_string()));
            }
        }
    }

    report
}
