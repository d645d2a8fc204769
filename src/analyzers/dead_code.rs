//! Dead code detector - finds public functions nothing refers to
//!
//! Counts whole-word occurrences of each public function name across the
//! non-test source corpus and subtracts one for the definition. A remainder
//! of zero or less marks the function dead. There is no scope or shadowing
//! awareness; false positives are expected.

use crate::models::FunctionRecord;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Entry points and lifecycle hooks that are called implicitly
const ALLOWED_NAMES: &[&str] = &["main", "__init__", "__str__", "__repr__", "setup", "teardown"];

static WORD: OnceLock<Regex> = OnceLock::new();

fn word_regex() -> &'static Regex {
    WORD.get_or_init(|| Regex::new(r"\w+").expect("valid word pattern"))
}

/// Names excluded from dead-code analysis regardless of references
pub fn is_exempt(name: &str) -> bool {
    ALLOWED_NAMES.contains(&name) || is_magic_method(name)
}

fn is_magic_method(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

/// Word-frequency index over the source corpus.
///
/// Counting an identifier here is equivalent to counting `\bname\b` matches.
pub struct ReferenceIndex {
    counts: FxHashMap<String, usize>,
    corpus: String,
}

impl ReferenceIndex {
    pub fn build<'a>(sources: impl IntoIterator<Item = &'a str>) -> Self {
        let mut corpus = String::new();
        for source in sources {
            corpus.push_str(source);
            corpus.push('\n');
        }
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for word in word_regex().find_iter(&corpus) {
            *counts.entry(word.as_str().to_string()).or_default() += 1;
        }
        Self { counts, corpus }
    }

    /// Whole-word occurrences of `name` in the corpus
    pub fn occurrences(&self, name: &str) -> usize {
        if name.is_empty() {
            return 0;
        }
        let is_single_word = word_regex()
            .find(name)
            .is_some_and(|m| m.start() == 0 && m.end() == name.len());
        if is_single_word {
            return self.counts.get(name).copied().unwrap_or(0);
        }
        // Names with non-word characters (e.g. `$`) need a real scan
        match Regex::new(&format!(r"\b{}\b", regex::escape(name))) {
            Ok(re) => re.find_iter(&self.corpus).count(),
            Err(_) => 0,
        }
    }
}

/// Mark dead public functions. Returns how many were flagged.
pub fn detect_dead_code<'a>(
    functions: impl IntoIterator<Item = &'a mut FunctionRecord>,
    index: &ReferenceIndex,
) -> usize {
    let mut dead = 0;
    for func in functions {
        if !func.is_public || is_exempt(&func.name) {
            continue;
        }
        let references = index.occurrences(&func.name) as i64 - 1;
        if references <= 0 {
            debug!("Dead code candidate: {}", func.qualified_name);
            func.metrics.is_dead_code = true;
            dead += 1;
        }
    }
    dead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionMetrics, Language};
    use std::path::PathBuf;

    fn func(name: &str, is_public: bool) -> FunctionRecord {
        FunctionRecord {
            name: name.into(),
            qualified_name: format!("mod.{name}"),
            file_path: PathBuf::from("mod.py"),
            line_start: 1,
            line_end: 2,
            language: Language::Python,
            source: String::new(),
            parameter_count: 0,
            is_public,
            docstring: None,
            metrics: FunctionMetrics::default(),
        }
    }

    #[test]
    fn test_exemptions() {
        assert!(is_exempt("main"));
        assert!(is_exempt("__eq__"));
        assert!(is_exempt("setup"));
        assert!(!is_exempt("__private"));
        assert!(!is_exempt("____"));
        assert!(!is_exempt("helper"));
    }

    #[test]
    fn test_whole_word_counting() {
        let index = ReferenceIndex::build(["def load(): pass\nload()\nreload()\nloader = 1"]);
        assert_eq!(index.occurrences("load"), 2);
        assert_eq!(index.occurrences("reload"), 1);
        assert_eq!(index.occurrences("missing"), 0);
    }

    #[test]
    fn test_non_word_names_fall_back_to_regex() {
        let index = ReferenceIndex::build(["function $get() {}", "x.$get()"]);
        // `\b` before `$` requires a preceding word char, so neither matches
        assert_eq!(index.occurrences("$get"), 0);
        assert_eq!(index.occurrences("get"), 2);
    }

    #[test]
    fn test_unreferenced_public_function_is_dead() {
        let index = ReferenceIndex::build([
            "def used(): pass\ndef unused(): pass\ndef _hidden(): pass\ndef main(): used()",
        ]);
        let mut funcs = vec![
            func("used", true),
            func("unused", true),
            func("_hidden", false),
            func("main", true),
        ];
        let dead = detect_dead_code(funcs.iter_mut(), &index);

        assert_eq!(dead, 1);
        assert!(!funcs[0].metrics.is_dead_code);
        assert!(funcs[1].metrics.is_dead_code);
        assert!(!funcs[2].metrics.is_dead_code);
        assert!(!funcs[3].metrics.is_dead_code);
    }

    #[test]
    fn test_name_absent_from_corpus_is_dead() {
        let index = ReferenceIndex::build(std::iter::empty());
        let mut funcs = vec![func("ghost", true)];
        assert_eq!(detect_dead_code(funcs.iter_mut(), &index), 1);
    }
}
