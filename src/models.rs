//! Core data models for codediag
//!
//! These models are used throughout the codebase for representing
//! ingested functions and modules, findings, and the diagnosis report.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source languages understood by the ingestion contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Go,
    Rust,
    CSharp,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Go,
        Language::Rust,
        Language::CSharp,
    ];

    /// Map a file extension (without the dot) to a language
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "py" | "pyw" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            "cs" => Some(Language::CSharp),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Language> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Language::from_extension)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::CSharp => "csharp",
        };
        f.write_str(name)
    }
}

/// Analysis scratch state for a function.
///
/// Each flag has exactly one writer: complexity (complexity scorer),
/// `is_tested` (coverage-gap detector), `is_dead_code` (dead-code detector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMetrics {
    pub complexity: u32,
    pub is_tested: bool,
    pub is_dead_code: bool,
}

impl Default for FunctionMetrics {
    fn default() -> Self {
        Self {
            complexity: 1,
            is_tested: false,
            is_dead_code: false,
        }
    }
}

/// A function discovered by a parser collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub qualified_name: String,
    pub file_path: PathBuf,
    pub line_start: u32,
    pub line_end: u32,
    pub language: Language,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub parameter_count: u32,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub metrics: FunctionMetrics,
}

fn default_true() -> bool {
    true
}

impl FunctionRecord {
    pub fn complexity(&self) -> u32 {
        self.metrics.complexity
    }

    /// Number of source lines spanned, at least 1
    pub fn span(&self) -> u32 {
        (self.line_end.saturating_sub(self.line_start) + 1).max(1)
    }
}

/// A source file and the functions it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub file_path: PathBuf,
    pub language: Language,
    #[serde(default)]
    pub line_count: usize,
    #[serde(default)]
    pub functions: Vec<FunctionRecord>,
    #[serde(default)]
    pub imports: Vec<String>,
    /// Paths of modules importing this one (filled by the coupling analyzer)
    #[serde(default)]
    pub imported_by: Vec<PathBuf>,
    #[serde(default)]
    pub average_complexity: f64,
    #[serde(default)]
    pub max_complexity: u32,
    /// Full file text, when the collaborator supplied it
    #[serde(default, skip_serializing)]
    pub source: Option<String>,
}

impl ModuleRecord {
    /// Recompute average (2 decimals) and max complexity from owned functions
    pub fn refresh_complexity_stats(&mut self) {
        if self.functions.is_empty() {
            self.average_complexity = 0.0;
            self.max_complexity = 0;
            return;
        }
        let total: u64 = self.functions.iter().map(|f| f.complexity() as u64).sum();
        let avg = total as f64 / self.functions.len() as f64;
        self.average_complexity = (avg * 100.0).round() / 100.0;
        self.max_complexity = self
            .functions
            .iter()
            .map(|f| f.complexity())
            .max()
            .unwrap_or(0);
    }
}

/// Afferent/efferent coupling for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingRecord {
    pub module_path: PathBuf,
    pub afferent: usize,
    pub efferent: usize,
    pub instability: f64,
}

impl CouplingRecord {
    pub fn new(module_path: PathBuf, afferent: usize, efferent: usize) -> Self {
        let total = afferent + efferent;
        let instability = if total == 0 {
            0.0
        } else {
            ((efferent as f64 / total as f64) * 1000.0).round() / 1000.0
        };
        Self {
            module_path,
            afferent,
            efferent,
            instability,
        }
    }

    pub fn total(&self) -> usize {
        self.afferent + self.efferent
    }
}

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Lenient parse used for external reviewer replies
    pub fn parse(s: &str) -> Option<Severity> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "warning" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// What kind of problem a finding describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Bug,
    Security,
    ErrorHandling,
    DeadCode,
    Complexity,
    Coupling,
    MissingTests,
    Style,
}

impl Category {
    /// Lenient parse accepting `error_handling` as well as `error-handling`
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "bug" => Some(Category::Bug),
            "security" => Some(Category::Security),
            "error-handling" => Some(Category::ErrorHandling),
            "dead-code" => Some(Category::DeadCode),
            "complexity" => Some(Category::Complexity),
            "coupling" => Some(Category::Coupling),
            "missing-tests" => Some(Category::MissingTests),
            "style" => Some(Category::Style),
            _ => None,
        }
    }
}

/// Which pipeline produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FindingSource {
    #[default]
    Static,
    Ai,
    Security,
}

/// A proposed remediation attached to a finding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestedFix {
    pub description: String,
    #[serde(default)]
    pub code_before: String,
    #[serde(default)]
    pub code_after: String,
    #[serde(default)]
    pub explanation: String,
}

impl SuggestedFix {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.code_before = before.into();
        self.code_after = after.into();
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Whether an auto-fixer can apply this fix
    pub fn is_applicable(&self) -> bool {
        !self.code_before.is_empty() && !self.code_after.is_empty()
    }
}

/// Identity of the function a finding points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRef {
    pub name: String,
    pub qualified_name: String,
    pub language: Language,
}

impl From<&FunctionRecord> for FunctionRef {
    fn from(func: &FunctionRecord) -> Self {
        Self {
            name: func.name.clone(),
            qualified_name: func.qualified_name.clone(),
            language: func.language,
        }
    }
}

/// One reported issue
///
/// Findings are value objects: built once through the constructors below,
/// then only re-labelled (path relativisation, id assignment) by the
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default)]
    pub id: String,
    pub severity: Severity,
    pub category: Category,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub file_path: PathBuf,
    #[serde(default)]
    pub line_start: u32,
    #[serde(default)]
    pub line_end: u32,
    #[serde(default)]
    pub function: Option<FunctionRef>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub source: FindingSource,
    #[serde(default)]
    pub suggested_fix: Option<SuggestedFix>,
}

fn default_confidence() -> f64 {
    1.0
}

impl Finding {
    pub fn new(
        source: FindingSource,
        severity: Severity,
        category: Category,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            severity,
            category,
            title: title.into(),
            description: description.into(),
            file_path: PathBuf::new(),
            line_start: 0,
            line_end: 0,
            function: None,
            confidence: 1.0,
            source,
            suggested_fix: None,
        }
    }

    pub fn at(mut self, file_path: impl Into<PathBuf>, line_start: u32, line_end: u32) -> Self {
        self.file_path = file_path.into();
        self.line_start = line_start;
        self.line_end = line_end;
        self
    }

    /// Attach the function's identity and location
    pub fn for_function(self, func: &FunctionRecord) -> Self {
        let mut finding = self.at(func.file_path.clone(), func.line_start, func.line_end);
        finding.function = Some(FunctionRef::from(func));
        finding
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.suggested_fix = Some(fix);
        self
    }

    pub fn has_location(&self) -> bool {
        !self.file_path.as_os_str().is_empty()
    }
}

/// Overall health label derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthLabel {
    Healthy,
    Moderate,
    AtRisk,
    Critical,
}

impl HealthLabel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => HealthLabel::Healthy,
            s if s >= 60.0 => HealthLabel::Moderate,
            s if s >= 40.0 => HealthLabel::AtRisk,
            _ => HealthLabel::Critical,
        }
    }
}

impl std::fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthLabel::Healthy => write!(f, "healthy"),
            HealthLabel::Moderate => write!(f, "moderate"),
            HealthLabel::AtRisk => write!(f, "at-risk"),
            HealthLabel::Critical => write!(f, "critical"),
        }
    }
}

/// Final output of a diagnosis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub findings: Vec<Finding>,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub health_score: f64,
    pub health_label: HealthLabel,
    pub summary: String,
    pub ai_tokens_used: u64,
    pub functions_analyzed: usize,
}

impl DiagnosisReport {
    /// Findings filtered by severity and truncated, for display only.
    ///
    /// An empty filter keeps every severity. Counts on the report are untouched.
    pub fn visible_findings(&self, severities: &[Severity], top: Option<usize>) -> Vec<&Finding> {
        let limit = top.unwrap_or(usize::MAX);
        self.findings
            .iter()
            .filter(|f| severities.is_empty() || severities.contains(&f.severity))
            .take(limit)
            .collect()
    }

    /// Process exit code: failure when any critical finding exists
    pub fn exit_code(&self) -> i32 {
        if self.critical_count > 0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instability_zero_without_edges() {
        let record = CouplingRecord::new(PathBuf::from("a.py"), 0, 0);
        assert_eq!(record.instability, 0.0);
    }

    #[test]
    fn test_instability_rounded_to_three_decimals() {
        let record = CouplingRecord::new(PathBuf::from("a.py"), 2, 1);
        assert_eq!(record.instability, 0.333);
        let record = CouplingRecord::new(PathBuf::from("a.py"), 0, 4);
        assert_eq!(record.instability, 1.0);
    }

    #[test]
    fn test_category_parse_accepts_both_spellings() {
        assert_eq!(Category::parse("error_handling"), Some(Category::ErrorHandling));
        assert_eq!(Category::parse("Error-Handling"), Some(Category::ErrorHandling));
        assert_eq!(Category::parse("nonsense"), None);
    }

    #[test]
    fn test_health_label_boundaries() {
        assert_eq!(HealthLabel::from_score(80.0), HealthLabel::Healthy);
        assert_eq!(HealthLabel::from_score(79.9), HealthLabel::Moderate);
        assert_eq!(HealthLabel::from_score(60.0), HealthLabel::Moderate);
        assert_eq!(HealthLabel::from_score(40.0), HealthLabel::AtRisk);
        assert_eq!(HealthLabel::from_score(39.9), HealthLabel::Critical);
        assert_eq!(HealthLabel::AtRisk.to_string(), "at-risk");
    }

    #[test]
    fn test_confidence_is_clamped() {
        let f = Finding::new(
            FindingSource::Ai,
            Severity::Info,
            Category::Bug,
            "t",
            "d",
        )
        .with_confidence(1.7);
        assert_eq!(f.confidence, 1.0);
        let f = f.with_confidence(-0.2);
        assert_eq!(f.confidence, 0.0);
    }

    #[test]
    fn test_category_serializes_kebab_case() {
        let json = serde_json::to_string(&Category::MissingTests).expect("serialize");
        assert_eq!(json, "\"missing-tests\"");
    }

    #[test]
    fn test_refresh_complexity_stats() {
        let mut module = ModuleRecord {
            file_path: PathBuf::from("m.py"),
            language: Language::Python,
            line_count: 10,
            functions: vec![],
            imports: vec![],
            imported_by: vec![],
            average_complexity: 0.0,
            max_complexity: 0,
            source: None,
        };
        module.refresh_complexity_stats();
        assert_eq!(module.max_complexity, 0);

        for c in [1, 2, 4] {
            module.functions.push(FunctionRecord {
                name: format!("f{c}"),
                qualified_name: format!("m.f{c}"),
                file_path: PathBuf::from("m.py"),
                line_start: 1,
                line_end: 2,
                language: Language::Python,
                source: String::new(),
                parameter_count: 0,
                is_public: true,
                docstring: None,
                metrics: FunctionMetrics {
                    complexity: c,
                    ..Default::default()
                },
            });
        }
        module.refresh_complexity_stats();
        assert_eq!(module.max_complexity, 4);
        assert_eq!(module.average_complexity, 2.33);
    }
}
