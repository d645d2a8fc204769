//! Coverage gap finder - cross-references public functions with test files
//!
//! Runs once per language against that language's lower-cased test corpus.
//! A function counts as tested when a test naming convention mentions it,
//! or when its name shares a line with an assertion or mocking keyword.

use crate::models::FunctionRecord;
use regex::Regex;
use tracing::debug;

const ASSERTION_KEYWORDS: &str = "assert|expect|mock|spy|stub";

/// Concatenated, lower-cased test sources for one language
pub struct TestCorpus {
    text: String,
    file_count: usize,
}

impl TestCorpus {
    pub fn new<'a>(contents: impl IntoIterator<Item = &'a str>) -> Self {
        let mut text = String::new();
        let mut file_count = 0;
        for content in contents {
            text.push_str(&content.to_lowercase());
            text.push('\n');
            file_count += 1;
        }
        Self { text, file_count }
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    /// Whether any convention or assertion line references `name`
    pub fn mentions(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        if name.is_empty() {
            return false;
        }

        let conventions = [
            format!("test_{name}"),
            format!("test{name}"),
            format!("{name}_test"),
            format!("{name}test"),
            format!("should_{name}"),
        ];
        if conventions.iter().any(|c| self.text.contains(c.as_str())) {
            return true;
        }

        let escaped = regex::escape(&name);
        let line_patterns = [
            format!(r"\b(?:describe|it)\b[^\n]*{escaped}"),
            format!(r"\b{escaped}\b[^\n]*(?:{ASSERTION_KEYWORDS})"),
            format!(r"(?:{ASSERTION_KEYWORDS})[^\n]*\b{escaped}\b"),
        ];
        line_patterns.iter().any(|p| match Regex::new(p) {
            Ok(re) => re.is_match(&self.text),
            Err(_) => false,
        })
    }
}

/// Set `is_tested` on the public functions of one language.
///
/// With no test files at all, every public function is untested and the
/// content scan is skipped. Returns the number of untested public functions.
pub fn mark_tested<'a>(
    functions: impl IntoIterator<Item = &'a mut FunctionRecord>,
    corpus: &TestCorpus,
) -> usize {
    let mut untested = 0;
    for func in functions {
        if !func.is_public {
            continue;
        }
        func.metrics.is_tested = !corpus.is_empty() && corpus.mentions(&func.name);
        if !func.metrics.is_tested {
            debug!("Untested: {}", func.qualified_name);
            untested += 1;
        }
    }
    untested
}
