//! Diagnose command implementation

use anyhow::{Context, Result};
use console::{style, Term};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::ai::ReplayReviewer;
use crate::analyzers::AnalysisEngine;
use crate::config::load_config;
use crate::diagnosis::DiagnosisEngine;
use crate::ingest::MetricsDocument;
use crate::models::{DiagnosisReport, HealthLabel, Severity};

/// Run the diagnose command. Returns 1 when critical findings exist.
pub fn run(
    path: &Path,
    metrics: &Path,
    no_ai: bool,
    ai_replies: Option<&Path>,
    output: Option<&Path>,
) -> Result<i32> {
    if !path.is_dir() {
        anyhow::bail!("Project root is not a directory: {}", path.display());
    }
    let root = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve project root {}", path.display()))?;
    let path = root.as_path();

    let mut config = load_config(path);
    if no_ai {
        config.ai.enabled = false;
    }

    let document = MetricsDocument::load(metrics)
        .with_context(|| format!("Failed to load metrics from {}", metrics.display()))?;
    let (modules, test_files) = document.into_parts();
    info!("Loaded {} modules from {}", modules.len(), metrics.display());

    let analysis = AnalysisEngine::new(path, &config.thresholds).analyze(modules, &test_files);

    let reviewer = match ai_replies {
        Some(replies) if config.ai.enabled => Some(
            ReplayReviewer::from_file(replies)
                .with_context(|| format!("Failed to load reviewer replies from {}", replies.display()))?,
        ),
        _ => None,
    };

    let mut engine = DiagnosisEngine::new(path, &config);
    if let Some(reviewer) = reviewer.as_ref() {
        engine = engine.with_reviewer(reviewer);
    }
    let report = engine.diagnose(&analysis);

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    match output {
        Some(out) => {
            fs::write(out, &json).with_context(|| format!("Failed to write {}", out.display()))?;
            print_summary(&report, &config.report.severity_filter, config.report.top_findings)?;
            Term::stdout().write_line(&format!(
                "\n{} {}",
                style("Report written to").dim(),
                out.display()
            ))?;
        }
        None => println!("{json}"),
    }

    Ok(report.exit_code())
}

fn print_summary(report: &DiagnosisReport, filter: &[Severity], top: usize) -> Result<()> {
    let term = Term::stdout();

    let score = format!("{:.1}", report.health_score);
    let score = match report.health_label {
        HealthLabel::Healthy => style(score).green().bold(),
        HealthLabel::Moderate => style(score).yellow().bold(),
        HealthLabel::AtRisk | HealthLabel::Critical => style(score).red().bold(),
    };
    term.write_line(&format!(
        "{} {} ({})",
        style("Health:").bold(),
        score,
        report.health_label
    ))?;
    term.write_line(&report.summary)?;

    let visible = report.visible_findings(filter, Some(top));
    if visible.is_empty() {
        return Ok(());
    }
    term.write_line("")?;
    for finding in visible {
        let severity = match finding.severity {
            Severity::Critical => style("CRITICAL").red().bold(),
            Severity::Warning => style("WARNING ").yellow(),
            Severity::Info => style("INFO    ").dim(),
        };
        term.write_line(&format!(
            "  {} {} {}",
            style(&finding.id).dim(),
            severity,
            finding.title
        ))?;
        if finding.has_location() {
            term.write_line(&format!(
                "           {}:{}",
                style(finding.file_path.display()).cyan(),
                finding.line_start
            ))?;
        }
    }
    Ok(())
}
