//! Static finding generator
//!
//! Turns analyzer signals (complexity, dead code, coupling, coverage gaps)
//! into findings. Every rule is a pure function of its inputs and the
//! configured thresholds.

use crate::analyzers::AnalysisReport;
use crate::config::Thresholds;
use crate::models::{
    Category, CouplingRecord, Finding, FindingSource, FunctionRecord, Severity, SuggestedFix,
};

/// Findings for every static signal in the analysis
pub fn generate_static_findings(analysis: &AnalysisReport, thresholds: &Thresholds) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(complexity_findings(
        &analysis.high_complexity_functions(thresholds.complexity),
        thresholds,
    ));
    findings.extend(dead_code_findings(&analysis.dead_code_functions(), thresholds));
    findings.extend(coupling_findings(&analysis.coupling_issues));
    findings.extend(missing_test_findings(&analysis.untested_functions(), thresholds));
    findings
}

fn complexity_severity(complexity: u32, thresholds: &Thresholds) -> Severity {
    if complexity >= thresholds.complexity_very_high
        || complexity >= thresholds.complexity_high.saturating_mul(2)
    {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

/// One finding per function above the complexity threshold
pub fn complexity_findings(functions: &[&FunctionRecord], thresholds: &Thresholds) -> Vec<Finding> {
    functions
        .iter()
        .filter(|f| f.complexity() > thresholds.complexity)
        .map(|func| {
            let cc = func.complexity();
            let lines = func.span();
            Finding::new(
                FindingSource::Static,
                complexity_severity(cc, thresholds),
                Category::Complexity,
                format!("High complexity in {}() (CC={})", func.name, cc),
                format!(
                    "{} has cyclomatic complexity {} ({} lines, L{}-L{}). \
                     Functions above CC {} are hard to test and maintain.",
                    func.qualified_name,
                    cc,
                    lines,
                    func.line_start,
                    func.line_end,
                    thresholds.complexity
                ),
            )
            .for_function(func)
            .with_fix(
                SuggestedFix::new(format!("Split {}() ({} lines, CC={})", func.name, lines, cc))
                    .with_explanation(format!(
                        "Extract logical blocks of {} into helpers to bring complexity \
                         from {} below {}.",
                        func.qualified_name, cc, thresholds.complexity
                    )),
            )
        })
        .collect()
}

/// Dead public functions; complex dead code ranks higher
pub fn dead_code_findings(functions: &[&FunctionRecord], thresholds: &Thresholds) -> Vec<Finding> {
    functions
        .iter()
        .map(|func| {
            let severity = if func.complexity() >= thresholds.complexity_high {
                Severity::Warning
            } else {
                Severity::Info
            };
            Finding::new(
                FindingSource::Static,
                severity,
                Category::DeadCode,
                format!("Dead code: {}()", func.name),
                format!(
                    "{} is not referenced anywhere else in the codebase. \
                     Removing it reduces maintenance cost.",
                    func.qualified_name
                ),
            )
            .for_function(func)
            .with_fix(
                SuggestedFix::new(format!("Remove {}() if it is unused", func.name))
                    .with_explanation("Dead code still has to be read, built and kept compiling."),
            )
        })
        .collect()
}

/// One warning per coupling record the caller flagged as an issue
pub fn coupling_findings(issues: &[CouplingRecord]) -> Vec<Finding> {
    issues
        .iter()
        .map(|record| {
            let name = record
                .module_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| record.module_path.display().to_string());
            Finding::new(
                FindingSource::Static,
                Severity::Warning,
                Category::Coupling,
                format!("High coupling in {name}"),
                format!(
                    "Module {} has afferent coupling {}, efferent coupling {}, \
                     instability {:.2}. Highly coupled modules are hard to refactor.",
                    record.module_path.display(),
                    record.afferent,
                    record.efferent,
                    record.instability
                ),
            )
            .at(record.module_path.clone(), 1, 1)
            .with_fix(
                SuggestedFix::new("Reduce the module's dependencies").with_explanation(
                    "Invert dependencies or extract interfaces so fewer modules depend on each other.",
                ),
            )
        })
        .collect()
}

/// Untested functions with notable complexity.
///
/// At or above the high threshold: warning. Between the minimum untested
/// complexity and the high threshold, public only: info.
pub fn missing_test_findings(functions: &[&FunctionRecord], thresholds: &Thresholds) -> Vec<Finding> {
    let mut findings = Vec::new();

    for func in functions.iter().filter(|f| !f.metrics.is_tested) {
        let cc = func.complexity();
        if cc >= thresholds.complexity_high {
            findings.push(
                Finding::new(
                    FindingSource::Static,
                    Severity::Warning,
                    Category::MissingTests,
                    format!("Complex function without tests: {}()", func.name),
                    format!(
                        "{} has complexity {} and no tests. Complex untested code is high risk.",
                        func.qualified_name, cc
                    ),
                )
                .for_function(func)
                .with_fix(
                    SuggestedFix::new(format!("Add unit tests for {}()", func.name))
                        .with_explanation("Test the most complex functions first."),
                ),
            );
        }
    }

    for func in functions.iter().filter(|f| !f.metrics.is_tested && f.is_public) {
        let cc = func.complexity();
        if cc >= thresholds.min_untested_complexity && cc < thresholds.complexity_high {
            findings.push(
                Finding::new(
                    FindingSource::Static,
                    Severity::Info,
                    Category::MissingTests,
                    format!("Function without tests: {}()", func.name),
                    format!("Public function {} (CC={}) has no tests.", func.qualified_name, cc),
                )
                .for_function(func),
            );
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionMetrics, Language};
    use std::path::PathBuf;

    fn func(name: &str, complexity: u32) -> FunctionRecord {
        FunctionRecord {
            name: name.into(),
            qualified_name: format!("app.{name}"),
            file_path: PathBuf::from("app.py"),
            line_start: 10,
            line_end: 40,
            language: Language::Python,
            source: String::new(),
            parameter_count: 1,
            is_public: true,
            docstring: None,
            metrics: FunctionMetrics {
                complexity,
                ..FunctionMetrics::default()
            },
        }
    }

    #[test]
    fn test_complexity_threshold_and_escalation() {
        let t = Thresholds::default();
        let funcs = [func("ok", 10), func("busy", 11), func("huge", 40), func("wild", 55)];
        let refs: Vec<&FunctionRecord> = funcs.iter().collect();
        let findings = complexity_findings(&refs, &t);

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[1].severity, Severity::Critical); // 2x high
        assert_eq!(findings[2].severity, Severity::Critical); // very high
        assert_eq!(findings[0].line_start, 10);
        assert_eq!(findings[0].line_end, 40);
        assert_eq!(findings[0].function.as_ref().unwrap().qualified_name, "app.busy");
        assert!(findings[0].title.contains("CC=11"));
    }

    #[test]
    fn test_dead_code_severity() {
        let t = Thresholds::default();
        let funcs = [func("small", 2), func("big", 20)];
        let refs: Vec<&FunctionRecord> = funcs.iter().collect();
        let findings = dead_code_findings(&refs, &t);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[1].severity, Severity::Warning);
        assert!(findings.iter().all(|f| f.category == Category::DeadCode));
    }

    #[test]
    fn test_coupling_finding_describes_metrics() {
        let record = CouplingRecord::new(PathBuf::from("pkg/hub.py"), 6, 4);
        let findings = coupling_findings(&[record]);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.severity, Severity::Warning);
        assert_eq!(f.title, "High coupling in hub.py");
        assert!(f.description.contains("afferent coupling 6"));
        assert!(f.description.contains("efferent coupling 4"));
        assert!(f.description.contains("instability 0.40"));
        assert_eq!(f.line_start, 1);
    }

    #[test]
    fn test_missing_tests_bands() {
        let t = Thresholds::default();
        let mut private = func("_helper", 7);
        private.is_public = false;
        let mut tested = func("covered", 30);
        tested.metrics.is_tested = true;
        let funcs = [func("trivial", 4), func("medium", 5), func("complex", 20), private, tested];
        let refs: Vec<&FunctionRecord> = funcs.iter().collect();
        let findings = missing_test_findings(&refs, &t);

        let summary: Vec<(&str, Severity)> = findings
            .iter()
            .map(|f| (f.function.as_ref().unwrap().name.as_str(), f.severity))
            .collect();
        assert_eq!(
            summary,
            vec![("complex", Severity::Warning), ("medium", Severity::Info)]
        );
    }

    #[test]
    fn test_missing_tests_not_capped() {
        let t = Thresholds::default();
        let funcs: Vec<FunctionRecord> = (0..50).map(|i| func(&format!("f{i}"), 6)).collect();
        let refs: Vec<&FunctionRecord> = funcs.iter().collect();
        assert_eq!(missing_test_findings(&refs, &t).len(), 50);
    }
}
