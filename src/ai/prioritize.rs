//! Review prioritization
//!
//! Complex, untested, public functions are reviewed first; dead code last.

use crate::analyzers::AnalysisReport;
use crate::models::FunctionRecord;

const UNTESTED_BONUS: i64 = 15;
const PUBLIC_BONUS: i64 = 5;
const DEAD_CODE_PENALTY: i64 = 20;

pub fn priority_score(func: &FunctionRecord) -> i64 {
    let mut score = func.complexity() as i64 * 2;
    if !func.metrics.is_tested {
        score += UNTESTED_BONUS;
    }
    if func.is_public {
        score += PUBLIC_BONUS;
    }
    if func.metrics.is_dead_code {
        score -= DEAD_CODE_PENALTY;
    }
    score
}

/// All reviewable functions, highest priority first.
///
/// Functions with blank source are skipped. Ties keep module order.
pub fn prioritize_functions(analysis: &AnalysisReport) -> Vec<&FunctionRecord> {
    let mut scored: Vec<(i64, &FunctionRecord)> = analysis
        .functions()
        .filter(|f| !f.source.trim().is_empty())
        .map(|f| (priority_score(f), f))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, f)| f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionMetrics, Language, ModuleRecord};
    use std::path::PathBuf;

    fn func(name: &str, complexity: u32, tested: bool, public: bool, dead: bool) -> FunctionRecord {
        FunctionRecord {
            name: name.into(),
            qualified_name: name.into(),
            file_path: PathBuf::from("m.py"),
            line_start: 1,
            line_end: 2,
            language: Language::Python,
            source: format!("def {name}(): pass"),
            parameter_count: 0,
            is_public: public,
            docstring: None,
            metrics: FunctionMetrics {
                complexity,
                is_tested: tested,
                is_dead_code: dead,
            },
        }
    }

    #[test]
    fn test_priority_score_weights() {
        assert_eq!(priority_score(&func("a", 10, false, true, false)), 40);
        assert_eq!(priority_score(&func("b", 10, true, true, false)), 25);
        assert_eq!(priority_score(&func("c", 10, true, false, true)), 0);
    }

    #[test]
    fn test_order_and_blank_source_excluded() {
        let mut blank = func("blank", 50, false, true, false);
        blank.source = "   \n".into();
        let module = ModuleRecord {
            file_path: PathBuf::from("m.py"),
            language: Language::Python,
            line_count: 10,
            functions: vec![
                func("low", 1, true, false, false),
                func("dead", 12, false, true, true),
                blank,
                func("hot", 12, false, true, false),
                func("tie", 1, true, false, false),
            ],
            imports: vec![],
            imported_by: vec![],
            average_complexity: 0.0,
            max_complexity: 0,
            source: None,
        };
        let analysis = AnalysisReport {
            modules: vec![module],
            ..Default::default()
        };
        let names: Vec<&str> = prioritize_functions(&analysis)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["hot", "dead", "low", "tie"]);
    }
}
