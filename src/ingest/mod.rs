//! Metrics ingestion contract
//!
//! The core never parses source syntax. Parser collaborators hand over one
//! [`ParsedFile`] per source file, and a test-file locator lists the test
//! files per language. Both are capability traits registered explicitly at
//! startup; the CLI instead reads a serialized [`MetricsDocument`].

use crate::models::{FunctionMetrics, FunctionRecord, Language, ModuleRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A function as reported by a parser collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFunction {
    pub name: String,
    #[serde(default)]
    pub qualified_name: Option<String>,
    pub line_start: u32,
    pub line_end: u32,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub parameter_count: u32,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub docstring: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Everything a parser collaborator reports for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub language: Language,
    #[serde(default)]
    pub line_count: usize,
    #[serde(default)]
    pub functions: Vec<ParsedFunction>,
    #[serde(default)]
    pub imports: Vec<String>,
    /// Full file text; read from disk when absent
    #[serde(default)]
    pub source: Option<String>,
}

impl ParsedFile {
    /// Build the module record that owns this file's functions
    pub fn into_module(self) -> ModuleRecord {
        let path = self.path;
        let language = self.language;
        let functions = self
            .functions
            .into_iter()
            .map(|f| FunctionRecord {
                qualified_name: f.qualified_name.unwrap_or_else(|| f.name.clone()),
                name: f.name,
                file_path: path.clone(),
                line_start: f.line_start,
                line_end: f.line_end,
                language,
                source: f.source,
                parameter_count: f.parameter_count,
                is_public: f.is_public,
                docstring: f.docstring,
                metrics: FunctionMetrics::default(),
            })
            .collect();

        ModuleRecord {
            file_path: path,
            language,
            line_count: self.line_count,
            functions,
            imports: self.imports,
            imported_by: Vec::new(),
            average_complexity: 0.0,
            max_complexity: 0,
            source: self.source,
        }
    }
}

/// Serialized collaborator output consumed by the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsDocument {
    #[serde(default)]
    pub files: Vec<ParsedFile>,
    /// Test files recognized per language
    #[serde(default)]
    pub test_files: BTreeMap<Language, Vec<PathBuf>>,
}

impl MetricsDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metrics file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metrics file {}", path.display()))
    }

    pub fn into_parts(self) -> (Vec<ModuleRecord>, BTreeMap<Language, Vec<PathBuf>>) {
        let modules = self.files.into_iter().map(ParsedFile::into_module).collect();
        (modules, self.test_files)
    }
}

/// Parser collaborator capability: one per language
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &Path, source: &str) -> Result<ParsedFile>;
}

/// Test-file locator capability
pub trait TestFileLocator: Send + Sync {
    fn locate(&self, root: &Path, language: Language) -> Vec<PathBuf>;
}

/// Explicit language → parser factory map, filled at startup
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<Language, Box<dyn SourceParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, language: Language, parser: Box<dyn SourceParser>) -> Self {
        self.parsers.insert(language, parser);
        self
    }

    pub fn supports(&self, language: Language) -> bool {
        self.parsers.contains_key(&language)
    }

    /// Parse each file with its language's parser.
    ///
    /// Files without a registered parser are skipped; read or parse failures
    /// degrade to an empty module for that file.
    pub fn parse_files(&self, root: &Path, files: &[PathBuf]) -> Vec<ModuleRecord> {
        let mut modules = Vec::new();
        for rel in files {
            let Some(language) = Language::from_path(rel) else {
                continue;
            };
            let Some(parser) = self.parsers.get(&language) else {
                continue;
            };
            let full = root.join(rel);
            let source = read_lossy(&full);
            let parsed = match parser.parse(&full, &source) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!("Parser failed for {}: {:#}", full.display(), e);
                    ParsedFile {
                        path: full.clone(),
                        language,
                        line_count: source.lines().count(),
                        functions: Vec::new(),
                        imports: Vec::new(),
                        source: None,
                    }
                }
            };
            let mut module = parsed.into_module();
            if module.source.is_none() {
                module.source = Some(source);
            }
            modules.push(module);
        }
        modules
    }

    /// Collect test files for every language that has a parser
    pub fn locate_tests(
        &self,
        root: &Path,
        locator: &dyn TestFileLocator,
    ) -> BTreeMap<Language, Vec<PathBuf>> {
        Language::ALL
            .iter()
            .filter(|l| self.supports(**l))
            .map(|l| (*l, locator.locate(root, *l)))
            .collect()
    }
}

/// Read a file as text, replacing invalid UTF-8 and returning an empty
/// string when the file cannot be read.
pub fn read_lossy(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneFunctionParser;

    impl SourceParser for OneFunctionParser {
        fn parse(&self, path: &Path, source: &str) -> Result<ParsedFile> {
            if source.contains("BROKEN") {
                anyhow::bail!("syntax error");
            }
            Ok(ParsedFile {
                path: path.to_path_buf(),
                language: Language::Python,
                line_count: source.lines().count(),
                functions: vec![ParsedFunction {
                    name: "run".into(),
                    qualified_name: None,
                    line_start: 1,
                    line_end: 2,
                    source: source.to_string(),
                    parameter_count: 0,
                    is_public: true,
                    docstring: None,
                }],
                imports: vec!["os".into()],
                source: None,
            })
        }
    }

    struct FixedLocator;

    impl TestFileLocator for FixedLocator {
        fn locate(&self, root: &Path, _language: Language) -> Vec<PathBuf> {
            vec![root.join("tests/test_app.py")]
        }
    }

    #[test]
    fn test_registry_parses_and_degrades() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.py"), "def run():\n    pass\n").unwrap();
        std::fs::write(dir.path().join("bad.py"), "BROKEN").unwrap();
        std::fs::write(dir.path().join("main.go"), "package main").unwrap();

        let registry = ParserRegistry::new().register(Language::Python, Box::new(OneFunctionParser));
        let modules = registry.parse_files(
            dir.path(),
            &[
                PathBuf::from("app.py"),
                PathBuf::from("bad.py"),
                PathBuf::from("main.go"),
                PathBuf::from("missing.py"),
            ],
        );

        assert_eq!(modules.len(), 3);
        assert_eq!(modules[0].functions.len(), 1);
        assert_eq!(modules[0].functions[0].qualified_name, "run");
        assert_eq!(modules[0].functions[0].metrics.complexity, 1);
        assert!(modules[0].source.as_deref().unwrap().contains("def run"));
        assert!(modules[1].functions.is_empty());
        // unreadable file still yields a (parsed) empty-source module
        assert_eq!(modules[2].source.as_deref(), Some(""));
    }

    #[test]
    fn test_locate_tests_only_for_registered_languages() {
        let registry = ParserRegistry::new().register(Language::Python, Box::new(OneFunctionParser));
        let tests = registry.locate_tests(Path::new("/repo"), &FixedLocator);
        assert_eq!(tests.len(), 1);
        assert!(tests.contains_key(&Language::Python));
    }

    #[test]
    fn test_metrics_document_from_json() {
        let json = r#"{
            "files": [{
                "path": "src/app.py",
                "language": "python",
                "line_count": 4,
                "functions": [{"name": "f", "qualified_name": "app.f", "line_start": 1, "line_end": 3, "source": "def f(): pass"}],
                "imports": ["os"]
            }],
            "test_files": {"python": ["tests/test_app.py"]}
        }"#;
        let doc: MetricsDocument = serde_json::from_str(json).unwrap();
        let (modules, tests) = doc.into_parts();
        assert_eq!(modules.len(), 1);
        assert!(modules[0].functions[0].is_public);
        assert_eq!(modules[0].functions[0].file_path, PathBuf::from("src/app.py"));
        assert_eq!(tests[&Language::Python].len(), 1);
    }
}
