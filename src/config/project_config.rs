//! Project-level configuration support
//!
//! Loads per-project configuration from `codediag.toml` in the project root.
//!
//! # Configuration Format
//!
//! ```toml
//! # codediag.toml
//!
//! [ai]
//! enabled = true
//! model = "claude-sonnet-4-20250514"
//! max_functions = 10
//! concurrency = 3
//! min_confidence = 0.6
//!
//! [thresholds]
//! complexity = 10
//! complexity_high = 20
//! complexity_very_high = 50
//! min_untested_complexity = 5
//! coupling = 8
//!
//! [report]
//! severity_filter = ["critical", "warning"]
//! top_findings = 5
//! ```

use crate::models::Severity;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "codediag.toml";

/// Project configuration loaded from codediag.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub ai: AiSettings,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub report: ReportSettings,
}

/// External reviewer settings
#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    /// Run the AI review stage when a credential is available (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum functions sent for review per run
    #[serde(default = "default_max_functions")]
    pub max_functions: usize,

    /// Size of the review worker pool
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Reviewer findings below this confidence are dropped
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Access credential. Never read from the project file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            max_functions: default_max_functions(),
            concurrency: default_concurrency(),
            min_confidence: default_min_confidence(),
            api_key: None,
        }
    }
}

impl AiSettings {
    /// The AI stage runs only when enabled and a non-empty credential exists
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn default_true() -> bool {
    true
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_max_functions() -> usize {
    10
}
fn default_concurrency() -> usize {
    3
}
fn default_min_confidence() -> f64 {
    0.6
}

/// Analysis thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    /// Functions above this complexity get a complexity finding
    #[serde(default = "default_complexity")]
    pub complexity: u32,

    #[serde(default = "default_complexity_high")]
    pub complexity_high: u32,

    #[serde(default = "default_complexity_very_high")]
    pub complexity_very_high: u32,

    /// Untested functions below this complexity are not reported
    #[serde(default = "default_min_untested_complexity")]
    pub min_untested_complexity: u32,

    /// Modules whose afferent + efferent coupling exceeds this are flagged
    #[serde(default = "default_coupling")]
    pub coupling: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            complexity: default_complexity(),
            complexity_high: default_complexity_high(),
            complexity_very_high: default_complexity_very_high(),
            min_untested_complexity: default_min_untested_complexity(),
            coupling: default_coupling(),
        }
    }
}

fn default_complexity() -> u32 {
    10
}
fn default_complexity_high() -> u32 {
    20
}
fn default_complexity_very_high() -> u32 {
    50
}
fn default_min_untested_complexity() -> u32 {
    5
}
fn default_coupling() -> usize {
    8
}

/// Display settings for report consumers
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_severity_filter")]
    pub severity_filter: Vec<Severity>,

    #[serde(default = "default_top_findings")]
    pub top_findings: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            severity_filter: default_severity_filter(),
            top_findings: default_top_findings(),
        }
    }
}

fn default_severity_filter() -> Vec<Severity> {
    vec![Severity::Critical, Severity::Warning]
}
fn default_top_findings() -> usize {
    5
}

/// Load project configuration from the project root.
///
/// Returns default configuration if no config file is found or if it
/// cannot be parsed. The AI credential is resolved separately.
pub fn load_project_config(root: &Path) -> ProjectConfig {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, root.display());
        return ProjectConfig::default();
    }

    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded project config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {:#}", path.display(), e);
            ProjectConfig::default()
        }
    }
}

fn load_toml_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ProjectConfig =
        toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))?;
    Ok(config)
}
