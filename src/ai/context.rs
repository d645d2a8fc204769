//! Review context for a single function
//!
//! Gives the reviewer what surrounds the function: the module's imports,
//! its sibling functions, and the source of the enclosing type for methods.

use crate::ingest::read_lossy;
use crate::models::{FunctionRecord, ModuleRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_IMPORTS: usize = 30;
const MAX_SIBLING_DOC_CHARS: usize = 60;
const MAX_TYPE_LINES: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewContext {
    pub imports: Vec<String>,
    /// Sibling names, each optionally followed by `  # <first docstring line>`
    pub siblings: Vec<String>,
    pub enclosing_type: Option<String>,
    pub docstring: Option<String>,
}

/// Build the context for `func` from the module that owns it.
///
/// `root` resolves relative module paths when the module source has to be
/// read from disk.
pub fn build_review_context(
    func: &FunctionRecord,
    modules: &[ModuleRecord],
    root: &Path,
) -> ReviewContext {
    let mut ctx = ReviewContext {
        docstring: func.docstring.clone().filter(|d| !d.trim().is_empty()),
        ..Default::default()
    };

    let Some(module) = modules.iter().find(|m| m.file_path == func.file_path) else {
        return ctx;
    };

    ctx.imports = module.imports.iter().take(MAX_IMPORTS).cloned().collect();

    ctx.siblings = module
        .functions
        .iter()
        .filter(|s| s.qualified_name != func.qualified_name)
        .map(|s| match s.docstring.as_deref().and_then(|d| d.lines().next()) {
            Some(first) if !first.trim().is_empty() => {
                let summary: String = first.trim().chars().take(MAX_SIBLING_DOC_CHARS).collect();
                format!("{}  # {}", s.name, summary)
            }
            _ => s.name.clone(),
        })
        .collect();

    if let Some(type_name) = enclosing_type_name(&func.qualified_name) {
        let source = match &module.source {
            Some(s) => s.clone(),
            None if module.file_path.is_absolute() => read_lossy(&module.file_path),
            None => read_lossy(&root.join(&module.file_path)),
        };
        ctx.enclosing_type = extract_type_source(&source, type_name);
    }

    ctx
}

/// `pkg.Account.deposit` -> `Account`
fn enclosing_type_name(qualified_name: &str) -> Option<&str> {
    let (owner, _) = qualified_name.rsplit_once('.')?;
    let name = owner.rsplit('.').next().unwrap_or(owner);
    (!name.is_empty()).then_some(name)
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Source of the type declaration named `type_name`, capped in length
pub fn extract_type_source(source: &str, type_name: &str) -> Option<String> {
    let name = regex::escape(type_name);
    let header = Regex::new(&format!(
        r"^\s*(?:(?:pub(?:\([^)]*\))?|public|private|protected|internal|export|abstract|final|static|sealed|partial)\s+)*(?:(?:class|struct|impl|interface)\s+{name}\b|type\s+{name}\s+struct\b)"
    ))
    .ok()?;

    let lines: Vec<&str> = source.lines().collect();
    let start = lines.iter().position(|l| header.is_match(l))?;
    let header_indent = indent_of(lines[start]);

    let mut body = vec![lines[start]];
    for &line in &lines[start + 1..] {
        if line.trim().is_empty() {
            body.push(line);
            continue;
        }
        if indent_of(line) <= header_indent {
            let trimmed = line.trim();
            // Allman-style opening brace on its own line
            if trimmed == "{" {
                body.push(line);
                continue;
            }
            if trimmed.starts_with('}') {
                body.push(line);
            }
            break;
        }
        body.push(line);
    }
    body.truncate(MAX_TYPE_LINES);

    Some(body.join("\n").trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionMetrics, Language};
    use std::path::PathBuf;

    fn func(name: &str, qualified: &str, doc: Option<&str>) -> FunctionRecord {
        FunctionRecord {
            name: name.into(),
            qualified_name: qualified.into(),
            file_path: PathBuf::from("bank.py"),
            line_start: 1,
            line_end: 2,
            language: Language::Python,
            source: String::new(),
            parameter_count: 0,
            is_public: true,
            docstring: doc.map(String::from),
            metrics: FunctionMetrics::default(),
        }
    }

    const BANK: &str = "import os\n\nclass Account:\n    def deposit(self, x):\n        self.total += x\n\n    def withdraw(self, x):\n        self.total -= x\n\ndef audit():\n    pass\n";

    fn module() -> ModuleRecord {
        ModuleRecord {
            file_path: PathBuf::from("bank.py"),
            language: Language::Python,
            line_count: 11,
            functions: vec![
                func("deposit", "bank.Account.deposit", Some("Add money to the account.\nMore.")),
                func("withdraw", "bank.Account.withdraw", None),
                func("audit", "bank.audit", Some(&"x".repeat(100))),
            ],
            imports: (0..40).map(|i| format!("mod{i}")).collect(),
            imported_by: vec![],
            average_complexity: 1.0,
            max_complexity: 1,
            source: Some(BANK.to_string()),
        }
    }

    #[test]
    fn test_method_gets_enclosing_class() {
        let modules = vec![module()];
        let target = &modules[0].functions[1];
        let ctx = build_review_context(target, &modules, Path::new("."));

        assert_eq!(ctx.imports.len(), 30);
        assert_eq!(
            ctx.siblings,
            vec![
                "deposit  # Add money to the account.".to_string(),
                format!("audit  # {}", "x".repeat(60)),
            ]
        );
        let class_src = ctx.enclosing_type.unwrap();
        assert!(class_src.starts_with("class Account:"));
        assert!(class_src.contains("def withdraw"));
        assert!(!class_src.contains("def audit"));
    }

    #[test]
    fn test_module_level_function_has_no_enclosing_type() {
        let modules = vec![module()];
        let ctx = build_review_context(&modules[0].functions[2], &modules, Path::new("."));
        assert_eq!(ctx.enclosing_type, None);
        assert!(ctx.docstring.is_some());
    }

    #[test]
    fn test_unknown_module_gives_empty_context() {
        let orphan = func("lost", "lost", None);
        let ctx = build_review_context(&orphan, &[], Path::new("."));
        assert_eq!(ctx, ReviewContext::default());
    }

    #[test]
    fn test_brace_language_type() {
        let src = "package bank;\n\npublic class Ledger {\n    void post() {}\n}\n\nclass Other {}\n";
        let out = extract_type_source(src, "Ledger").unwrap();
        assert_eq!(out, "public class Ledger {\n    void post() {}\n}");
        let go = "type Store struct {\n\tdb *DB\n}\n";
        assert_eq!(extract_type_source(go, "Store").unwrap(), "type Store struct {\n\tdb *DB\n}");
    }

    #[test]
    fn test_allman_brace_type() {
        let src = "namespace Bank\n{\n    public class Ledger\n    {\n        void Post() { }\n    }\n\n    class Other { }\n}\n";
        let out = extract_type_source(src, "Ledger").unwrap();
        assert_eq!(
            out,
            "    public class Ledger\n    {\n        void Post() { }\n    }"
        );
    }

    #[test]
    fn test_type_source_is_capped() {
        let mut src = String::from("class Big:\n");
        for i in 0..500 {
            src.push_str(&format!("    x{i} = {i}\n"));
        }
        let out = extract_type_source(&src, "Big").unwrap();
        assert_eq!(out.lines().count(), 200);
    }
}
