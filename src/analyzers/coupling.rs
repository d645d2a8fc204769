//! Module coupling analysis
//!
//! Builds a directed import graph across modules and derives afferent (Ca)
//! and efferent (Ce) coupling plus instability I = Ce / (Ca + Ce).
//!
//! Import identifiers are resolved heuristically. An identifier resolves to
//! a module when its dot-segments, joined with `/`, are a substring of the
//! module's path, or when its last dot-segment equals the module's file stem.

use crate::models::{CouplingRecord, ModuleRecord};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// Path as a `/`-separated string, so Windows paths resolve the same way
fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
}

/// Whether an import identifier refers to the candidate module path
pub fn import_matches(import: &str, candidate: &Path) -> bool {
    let import = import.trim();
    if import.is_empty() {
        return false;
    }
    let as_path = import.replace('.', "/");
    if !as_path.trim_matches('/').is_empty() && path_key(candidate).contains(&as_path) {
        return true;
    }
    let last = import.rsplit('.').next().unwrap_or(import);
    !last.is_empty() && last == file_stem(candidate)
}

/// Resolve each module's imports to the indices of other modules it depends on
fn resolve_imports(modules: &[ModuleRecord]) -> Vec<FxHashSet<usize>> {
    modules
        .iter()
        .enumerate()
        .map(|(i, module)| {
            let mut deps = FxHashSet::default();
            for import in &module.imports {
                for (j, candidate) in modules.iter().enumerate() {
                    if i != j
                        && candidate.file_path != module.file_path
                        && import_matches(import, &candidate.file_path)
                    {
                        deps.insert(j);
                    }
                }
            }
            deps
        })
        .collect()
}

/// Compute coupling for every module, in input order.
///
/// Fills each module's `imported_by` with the paths of modules importing it.
pub fn analyze_coupling(modules: &mut [ModuleRecord]) -> Vec<CouplingRecord> {
    let graph = resolve_imports(modules);

    let importers: Vec<Vec<PathBuf>> = (0..modules.len())
        .map(|target| {
            graph
                .iter()
                .enumerate()
                .filter(|(_, deps)| deps.contains(&target))
                .map(|(source, _)| modules[source].file_path.clone())
                .collect()
        })
        .collect();

    modules
        .iter_mut()
        .zip(importers)
        .zip(&graph)
        .map(|((module, imported_by), deps)| {
            let afferent = imported_by.len();
            module.imported_by = imported_by;
            CouplingRecord::new(module.file_path.clone(), afferent, deps.len())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn module(path: &str, imports: &[&str]) -> ModuleRecord {
        ModuleRecord {
            file_path: PathBuf::from(path),
            language: Language::Python,
            line_count: 10,
            functions: vec![],
            imports: imports.iter().map(|s| s.to_string()).collect(),
            imported_by: vec![],
            average_complexity: 0.0,
            max_complexity: 0,
            source: None,
        }
    }

    #[test]
    fn test_import_matching() {
        assert!(import_matches("app.models", Path::new("src/app/models.py")));
        assert!(import_matches("models", Path::new("src/app/models.py")));
        assert!(import_matches("x.y.models", Path::new("lib/models.py")));
        assert!(!import_matches("", Path::new("src/app/models.py")));
        assert!(!import_matches("os", Path::new("src/app/models.py")));
    }

    #[test]
    fn test_afferent_efferent_and_reverse_deps() {
        let mut modules = vec![
            module("app/main.py", &["app.service", "app.models"]),
            module("app/service.py", &["app.models"]),
            module("app/models.py", &[]),
        ];
        let coupling = analyze_coupling(&mut modules);

        assert_eq!(coupling.len(), 3);
        assert_eq!(coupling[0].module_path, PathBuf::from("app/main.py"));
        assert_eq!((coupling[0].afferent, coupling[0].efferent), (0, 2));
        assert_eq!(coupling[0].instability, 1.0);
        assert_eq!((coupling[1].afferent, coupling[1].efferent), (1, 1));
        assert_eq!(coupling[1].instability, 0.5);
        assert_eq!((coupling[2].afferent, coupling[2].efferent), (2, 0));
        assert_eq!(coupling[2].instability, 0.0);

        assert_eq!(
            modules[2].imported_by,
            vec![PathBuf::from("app/main.py"), PathBuf::from("app/service.py")]
        );
        assert!(modules[0].imported_by.is_empty());
    }

    #[test]
    fn test_self_import_not_counted() {
        let mut modules = vec![module("pkg/util.py", &["util", "pkg.util"])];
        let coupling = analyze_coupling(&mut modules);
        assert_eq!(coupling[0].total(), 0);
        assert_eq!(coupling[0].instability, 0.0);
    }

    #[test]
    fn test_duplicate_imports_count_once() {
        let mut modules = vec![
            module("a.py", &["b", "b", "pkg.b"]),
            module("b.py", &[]),
        ];
        let coupling = analyze_coupling(&mut modules);
        assert_eq!(coupling[0].efferent, 1);
        assert_eq!(coupling[1].afferent, 1);
    }

    #[test]
    fn test_instability_always_in_unit_range() {
        let mut modules = vec![
            module("a.py", &["b", "c", "d"]),
            module("b.py", &["a"]),
            module("c.py", &["a", "b"]),
            module("d.py", &[]),
            module("e.py", &[]),
        ];
        for record in analyze_coupling(&mut modules) {
            assert!((0.0..=1.0).contains(&record.instability));
            if record.total() == 0 {
                assert_eq!(record.instability, 0.0);
            }
        }
    }
}
