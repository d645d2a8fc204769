//! Analysis engine - runs the metric detectors over ingested modules
//!
//! ```text
//! modules ──► complexity ──► coverage gap (per language) ──► coupling ──► dead code
//!                                                                          │
//!                                                              AnalysisReport ◄┘
//! ```

use super::complexity::ComplexityScorer;
use super::coupling::analyze_coupling;
use super::coverage_gap::{mark_tested, TestCorpus};
use super::dead_code::{detect_dead_code, ReferenceIndex};
use crate::config::Thresholds;
use crate::ingest::read_lossy;
use crate::models::{CouplingRecord, FunctionRecord, Language, ModuleRecord};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directories holding test code rather than production source
const TEST_DIR_NAMES: &[&str] = &["tests", "test", "__tests__", "spec", "specs"];

/// Aggregated metrics for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub modules: Vec<ModuleRecord>,
    pub coupling: Vec<CouplingRecord>,
    /// Coupling records above the configured threshold
    pub coupling_issues: Vec<CouplingRecord>,
    pub total_functions: usize,
    pub tested_function_count: usize,
    /// Percentage of public functions marked tested (0 when none are public)
    pub estimated_coverage: f64,
    pub avg_complexity: f64,
    pub total_loc: usize,
}

impl AnalysisReport {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.modules.iter().flat_map(|m| m.functions.iter())
    }

    pub fn high_complexity_functions(&self, threshold: u32) -> Vec<&FunctionRecord> {
        self.functions().filter(|f| f.complexity() > threshold).collect()
    }

    pub fn dead_code_functions(&self) -> Vec<&FunctionRecord> {
        self.functions().filter(|f| f.metrics.is_dead_code).collect()
    }

    pub fn untested_functions(&self) -> Vec<&FunctionRecord> {
        self.functions()
            .filter(|f| f.is_public && !f.metrics.is_tested)
            .collect()
    }
}

pub struct AnalysisEngine<'a> {
    root: &'a Path,
    thresholds: &'a Thresholds,
    scorer: ComplexityScorer,
}

impl<'a> AnalysisEngine<'a> {
    pub fn new(root: &'a Path, thresholds: &'a Thresholds) -> Self {
        Self {
            root,
            thresholds,
            scorer: ComplexityScorer::new(),
        }
    }

    pub fn with_scorer(mut self, scorer: ComplexityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Only directories below the root count; a path outside it never does.
    fn is_in_test_dir(&self, path: &Path) -> bool {
        let rel = if path.is_absolute() {
            match path.strip_prefix(self.root) {
                Ok(rel) => rel,
                Err(_) => return false,
            }
        } else {
            path
        };
        let Some(parent) = rel.parent() else {
            return false;
        };
        parent
            .components()
            .any(|c| TEST_DIR_NAMES.contains(&c.as_os_str().to_string_lossy().as_ref()))
    }

    /// Run every detector and aggregate the results
    pub fn analyze(
        &self,
        modules: Vec<ModuleRecord>,
        test_files: &BTreeMap<Language, Vec<PathBuf>>,
    ) -> AnalysisReport {
        let test_set: HashSet<PathBuf> = test_files
            .values()
            .flatten()
            .map(|p| self.resolve(p))
            .collect();

        let mut modules: Vec<ModuleRecord> = modules
            .into_iter()
            .filter(|m| {
                let keep =
                    !test_set.contains(&self.resolve(&m.file_path)) && !self.is_in_test_dir(&m.file_path);
                if !keep {
                    debug!("Skipping test module {}", m.file_path.display());
                }
                keep
            })
            .collect();

        for module in &mut modules {
            if module.source.is_none() {
                module.source = Some(read_lossy(&self.resolve(&module.file_path)));
            }
            for func in &mut module.functions {
                func.metrics.complexity = self.scorer.score(func);
            }
            module.refresh_complexity_stats();
        }

        let languages: Vec<Language> = {
            let mut seen: Vec<Language> = modules.iter().map(|m| m.language).collect();
            seen.sort();
            seen.dedup();
            seen
        };
        for language in languages {
            let contents: Vec<String> = test_files
                .get(&language)
                .map(|files| files.iter().map(|p| read_lossy(&self.resolve(p))).collect())
                .unwrap_or_default();
            let corpus = TestCorpus::new(contents.iter().map(String::as_str));
            let untested = mark_tested(
                modules
                    .iter_mut()
                    .filter(|m| m.language == language)
                    .flat_map(|m| m.functions.iter_mut()),
                &corpus,
            );
            debug!(
                "{}: {} test files, {} untested public functions",
                language,
                contents.len(),
                untested
            );
        }

        let coupling = analyze_coupling(&mut modules);

        let index = ReferenceIndex::build(modules.iter().filter_map(|m| m.source.as_deref()));
        let dead = detect_dead_code(
            modules.iter_mut().flat_map(|m| m.functions.iter_mut()),
            &index,
        );

        let coupling_issues: Vec<CouplingRecord> = coupling
            .iter()
            .filter(|c| c.total() > self.thresholds.coupling)
            .cloned()
            .collect();

        let mut report = AnalysisReport {
            coupling,
            coupling_issues,
            total_loc: modules.iter().map(|m| m.line_count).sum(),
            ..Default::default()
        };
        report.modules = modules;

        let (count, tested, public, complexity_sum) = report.functions().fold(
            (0usize, 0usize, 0usize, 0u64),
            |(count, tested, public, sum), f| {
                (
                    count + 1,
                    tested + usize::from(f.metrics.is_tested),
                    public + usize::from(f.is_public),
                    sum + f.complexity() as u64,
                )
            },
        );
        report.total_functions = count;
        report.tested_function_count = tested;
        report.estimated_coverage = if public > 0 {
            round1(tested as f64 / public as f64 * 100.0)
        } else {
            0.0
        };
        report.avg_complexity = if count > 0 {
            round1(complexity_sum as f64 / count as f64)
        } else {
            0.0
        };

        info!(
            "Analysis: {} modules, {} functions, {} dead, {:.1}% estimated coverage",
            report.modules.len(),
            report.total_functions,
            dead,
            report.estimated_coverage
        );
        report
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
