//! Hardcoded secret scanner
//!
//! Scans raw file contents line by line, independent of the metrics
//! pipeline. The first matching pattern wins for a given line.
//! CWE-798: Use of Hard-coded Credentials

use crate::models::{Category, Finding, FindingSource, Severity, SuggestedFix};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

const SCANNABLE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "go", "rs", "cs", "yaml", "yml", "json", "toml",
    "env", "cfg", "ini",
];

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
    ".tox",
    ".nox",
    "target",
    "vendor",
];

const TEST_INDICATORS: &[&str] = &["tests", "test", "__tests__", "spec", "fixtures", "conftest"];

const CONFIDENCE_SOURCE: f64 = 0.85;
const CONFIDENCE_TEST: f64 = 0.4;

struct SecretPattern {
    label: &'static str,
    fix: &'static str,
    fallback_env: &'static str,
    pattern: Regex,
}

static SECRET_PATTERNS: OnceLock<Vec<SecretPattern>> = OnceLock::new();

fn patterns() -> &'static [SecretPattern] {
    SECRET_PATTERNS.get_or_init(|| {
        let table: [(&str, &str, &str, &str); 6] = [
            (
                "Hardcoded API key",
                "Move it to an environment variable",
                "API_KEY",
                r#"(?i)(api[_-]?key|apikey)\s*[:=]\s*['"][A-Za-z0-9]{16,}"#,
            ),
            (
                "Hardcoded secret",
                "Move it to an environment variable or a vault",
                "SECRET_KEY",
                r#"(?i)(secret|password|passwd|pwd)\s*[:=]\s*['"][^'"]{8,}"#,
            ),
            (
                "Exposed AWS access key",
                "Use IAM roles or AWS Secrets Manager",
                "AWS_ACCESS_KEY_ID",
                r#"(?i)(aws_access_key_id)\s*[:=]\s*['"]?AKIA[A-Z0-9]{16}"#,
            ),
            (
                "Embedded private key",
                "Move the key to a secure file outside the repository",
                "PRIVATE_KEY_PATH",
                r#"(?i)(private[_-]?key)\s*[:=]\s*['"]-----BEGIN"#,
            ),
            (
                "Hardcoded token",
                "Move it to an environment variable",
                "AUTH_TOKEN",
                r#"(?i)(token)\s*[:=]\s*['"][A-Za-z0-9_\-]{20,}"#,
            ),
            (
                "Connection string with credentials",
                "Read database credentials from environment variables",
                "DATABASE_URL",
                r#"(?i)(?:jdbc:[a-z]+|postgres(?:ql)?|mysql|mariadb|mongodb(?:\+srv)?|redis|amqp|mssql)://[^\s:/@'"]+:[^\s@'"]+@"#,
            ),
        ];
        table
            .into_iter()
            .map(|(label, fix, fallback_env, pattern)| SecretPattern {
                label,
                fix,
                fallback_env,
                pattern: Regex::new(pattern).expect("valid secret pattern"),
            })
            .collect()
    })
}

static ASSIGN_TARGET: OnceLock<Regex> = OnceLock::new();
static QUOTED_LITERAL: OnceLock<Regex> = OnceLock::new();

/// Environment variable name: the assignment target, else the pattern's fallback
fn suggest_env_var(line: &str, fallback: &str) -> String {
    let re = ASSIGN_TARGET.get_or_init(|| Regex::new(r"(\w+)\s*[:=]").expect("valid assignment pattern"));
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_uppercase())
        .unwrap_or_else(|| fallback.to_string())
}

/// Environment lookup expression for the file's language
fn env_lookup(path: &Path, var: &str) -> String {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "py" => format!("os.environ[\"{var}\"]"),
        "js" | "jsx" | "ts" | "tsx" => format!("process.env.{var}"),
        "java" => format!("System.getenv(\"{var}\")"),
        "go" => format!("os.Getenv(\"{var}\")"),
        "rs" => format!("std::env::var(\"{var}\")?"),
        "cs" => format!("Environment.GetEnvironmentVariable(\"{var}\")"),
        _ => format!("${{{var}}}"),
    }
}

/// Replace the quoted literal holding the secret with an environment lookup.
///
/// Falls back to `VAR = <lookup>` when the secret is not quoted.
fn replacement_line(code: &str, secret_start: usize, path: &Path, var: &str) -> String {
    let lookup = env_lookup(path, var);
    let re = QUOTED_LITERAL
        .get_or_init(|| Regex::new(r#""[^"]*"|'[^']*'"#).expect("valid literal pattern"));
    match re.find_iter(code).find(|m| m.end() > secret_start) {
        Some(m) => format!("{}{}{}", &code[..m.start()], lookup, &code[m.end()..]),
        None => format!("{var} = {lookup}"),
    }
}

/// Whether a path (relative to the scan root) looks like test code
pub fn is_test_path(path: &Path) -> bool {
    let in_test_dir = path.components().any(|c| {
        let part = c.as_os_str().to_string_lossy().to_lowercase();
        TEST_INDICATORS.contains(&part.as_str())
    });
    if in_test_dir {
        return true;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    stem.starts_with("test_") || stem.ends_with("_test") || stem.ends_with(".test") || stem.ends_with(".spec")
}

fn is_scannable(path: &Path) -> bool {
    if path.file_name().and_then(|n| n.to_str()) == Some(".env") {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCANNABLE_EXTENSIONS.contains(&ext))
}

/// Scan one file's contents. `relative` is the path reported in findings.
pub fn scan_content(relative: &Path, content: &str) -> Vec<Finding> {
    let is_test = is_test_path(relative);
    let mut findings = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx as u32 + 1;
        let Some(pattern) = patterns().iter().find(|p| p.pattern.is_match(line)) else {
            continue;
        };

        let finding = if is_test {
            Finding::new(
                FindingSource::Security,
                Severity::Info,
                Category::Security,
                format!("{} in test file", pattern.label),
                format!(
                    "Possible {} in test file {} line {}. Check that it is a mock value, not a real secret.",
                    pattern.label.to_lowercase(),
                    relative.display(),
                    line_num
                ),
            )
            .with_confidence(CONFIDENCE_TEST)
            .with_fix(
                SuggestedFix::new("Verify this is a mock value, not a real secret").with_explanation(
                    "Hardcoded mock values are normal in tests, as long as none is a real production secret.",
                ),
            )
        } else {
            let code = line.trim();
            let var = suggest_env_var(line, pattern.fallback_env);
            let secret_start = pattern.pattern.find(code).map(|m| m.start()).unwrap_or(0);
            let after = replacement_line(code, secret_start, relative, &var);
            Finding::new(
                FindingSource::Security,
                Severity::Critical,
                Category::Security,
                pattern.label,
                format!(
                    "Possible {} in {} line {}. Hardcoded secrets leak through the repository history.",
                    pattern.label.to_lowercase(),
                    relative.display(),
                    line_num
                ),
            )
            .with_confidence(CONFIDENCE_SOURCE)
            .with_fix(
                SuggestedFix::new(pattern.fix)
                    .with_code(code, after)
                    .with_explanation(format!(
                        "Read the value from the {var} environment variable or a secret manager instead."
                    )),
            )
        };
        findings.push(finding.at(relative.to_path_buf(), line_num, line_num));
    }

    findings
}

/// Walk the project and scan every eligible file, in file-name order.
///
/// Ignore files are not honored: a gitignored `.env` is still scanned.
pub fn scan_for_secrets(root: &Path) -> Vec<Finding> {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && entry.depth() > 0 && SKIP_DIRS.iter().any(|d| entry.file_name() == *d))
        })
        .build();

    let mut findings = Vec::new();
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_scannable(path) {
            continue;
        }
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                debug!("Skipping unreadable {}: {}", path.display(), e);
                continue;
            }
        };
        if bytes.contains(&0) {
            continue;
        }
        let content = String::from_utf8_lossy(&bytes);
        let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        findings.extend(scan_content(&relative, &content));
    }

    debug!("Secret scan found {} candidates", findings.len());
    findings
}
