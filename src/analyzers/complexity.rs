//! Cyclomatic complexity scoring
//!
//! Dedicated per-language counters can be registered on the scorer. When a
//! language has none, or its counter fails, the score comes from a
//! language-agnostic branch-token count: 1 plus every conditional, loop,
//! case/catch keyword, short-circuit operator and ternary in the source.

use crate::models::{FunctionRecord, Language};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// A language-specific complexity implementation
pub trait ComplexityCounter: Send + Sync {
    fn complexity(&self, source: &str) -> Result<u32>;
}

static BRANCH_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn branch_patterns() -> &'static [Regex] {
    BRANCH_PATTERNS.get_or_init(|| {
        [
            // `else if` is covered by `if`
            r"\bif\b",
            r"\belif\b",
            r"\bfor\b",
            r"\bwhile\b",
            r"\bcase\b",
            r"\bcatch\b",
            r"\bexcept\b",
            r"\band\b",
            r"\bor\b",
            r"&&",
            r"\|\|",
            // single-line ternary; `?` needs spaces around it so `x?.y` and `f()?::` don't count
            r"\s\?\s[^:\n?]+:",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid branch pattern"))
        .collect()
    })
}

/// Branch-token complexity, identical for every language
pub fn branch_token_complexity(source: &str) -> u32 {
    let branches: usize = branch_patterns()
        .iter()
        .map(|re| re.find_iter(source).count())
        .sum();
    1 + branches as u32
}

#[derive(Default)]
pub struct ComplexityScorer {
    counters: HashMap<Language, Box<dyn ComplexityCounter>>,
}

impl ComplexityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(mut self, language: Language, counter: Box<dyn ComplexityCounter>) -> Self {
        self.counters.insert(language, counter);
        self
    }

    /// Score one function. Never fails; always at least 1.
    pub fn score(&self, func: &FunctionRecord) -> u32 {
        if let Some(counter) = self.counters.get(&func.language) {
            match counter.complexity(&func.source) {
                Ok(value) if value >= 1 => return value,
                Ok(_) => debug!("{} counter returned 0 for {}", func.language, func.qualified_name),
                Err(e) => debug!(
                    "{} counter failed for {}: {:#}",
                    func.language, func.qualified_name, e
                ),
            }
        }
        branch_token_complexity(&func.source)
    }
}
