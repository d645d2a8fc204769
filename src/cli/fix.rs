//! Fix command implementation
//!
//! Applies the before/after snippets carried by a saved report's findings.

use anyhow::{Context, Result};
use console::{style, Term};
use std::fs;
use std::path::Path;

use crate::fixes::{apply_fixes, FixResult};
use crate::models::DiagnosisReport;

pub fn run(path: &Path, report_path: &Path, dry_run: bool) -> Result<()> {
    let json = fs::read_to_string(report_path)
        .with_context(|| format!("Failed to read report {}", report_path.display()))?;
    let report: DiagnosisReport =
        serde_json::from_str(&json).context("Failed to parse report")?;

    let result = apply_fixes(&report.findings, path, dry_run);

    let term = Term::stdout();
    if dry_run {
        term.write_line(&format!("{}", style("Dry run: no files were changed").yellow()))?;
    }
    print_group(&term, &result.applied, style("✓").green().bold().to_string())?;
    print_group(&term, &result.failed, style("✗").red().bold().to_string())?;

    term.write_line(&format!(
        "\n{} applied, {} skipped, {} failed",
        style(result.applied.len()).green().bold(),
        style(result.skipped.len()).dim(),
        style(result.failed.len()).red().bold()
    ))?;
    Ok(())
}

fn print_group(term: &Term, results: &[FixResult], marker: String) -> Result<()> {
    for r in results {
        term.write_line(&format!(
            "  {} {} {} ({})",
            marker,
            style(&r.finding_id).dim(),
            r.message,
            r.file_path.display()
        ))?;
    }
    Ok(())
}
