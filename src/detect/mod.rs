//! Semantic conflict detectors.
//!
//! Each detector is an independent pass over one file's detection input: the
//! structural changes every task recorded, plus every task's before/after
//! text. Detectors share a [`SymbolTables`] cache so a task's table is parsed
//! at most once per call, whichever detector asks for it first.
//!
//! # Failure policy
//!
//! Detectors never fail. A task whose text is missing or unparseable is
//! skipped for the checks that need it; the rest of the call proceeds.

pub mod aggregate;
pub mod imports;
pub mod rename;
pub mod return_type;
pub mod variables;

use std::collections::BTreeMap;
use std::path::Path;

use crate::model::change::{FileAnalysis, FileVersions, Version};
use crate::model::conflict::{ConflictKind, SemanticConflict};
use crate::model::types::TaskId;
use crate::symbols::{SymbolExtractor, SymbolTable};

pub use aggregate::{SemanticConflictDetector, detect_semantic_conflicts};
pub use imports::ImportRemovalDetector;
pub use rename::FunctionRenameDetector;
pub use return_type::ReturnTypeDetector;
pub use variables::VariableRenameDetector;

// ---------------------------------------------------------------------------
// Detector trait
// ---------------------------------------------------------------------------

/// One semantic conflict pass.
///
/// # Invariants
/// - Pure: the result depends only on `input` (tables are derived from it).
/// - Deterministic: iteration follows task-id order, then record order.
/// - Infallible: missing data shrinks the result, never aborts it.
pub trait SemanticDetector {
    /// The class of conflict this pass reports.
    fn kind(&self) -> ConflictKind;

    /// Run the pass over one file.
    fn detect(
        &self,
        input: &DetectionInput<'_>,
        tables: &mut SymbolTables<'_>,
    ) -> Vec<SemanticConflict>;
}

// ---------------------------------------------------------------------------
// DetectionInput
// ---------------------------------------------------------------------------

/// Borrowed view of one detection call's inputs.
#[derive(Clone, Copy, Debug)]
pub struct DetectionInput<'a> {
    /// The analysed file, taken from the first task's analysis.
    pub file_path: &'a Path,
    pub task_changes: &'a BTreeMap<TaskId, FileAnalysis>,
    pub task_file_contents: &'a BTreeMap<TaskId, FileVersions>,
}

impl<'a> DetectionInput<'a> {
    /// Bundle the inputs. Returns `None` when there are no tasks, since there
    /// is then no file path to report against.
    #[must_use]
    pub fn new(
        task_changes: &'a BTreeMap<TaskId, FileAnalysis>,
        task_file_contents: &'a BTreeMap<TaskId, FileVersions>,
    ) -> Option<Self> {
        let file_path = task_changes.values().next()?.file_path.as_path();
        Some(Self {
            file_path,
            task_changes,
            task_file_contents,
        })
    }

    /// Tasks that supplied text, in id order.
    pub fn checked_tasks(self) -> impl Iterator<Item = &'a TaskId> {
        self.task_file_contents.keys()
    }
}

// ---------------------------------------------------------------------------
// SymbolTables
// ---------------------------------------------------------------------------

/// Lazily built symbol tables for one detection call, keyed by task and
/// version. Failed builds are remembered as `None` so they are not retried.
#[derive(Debug)]
pub struct SymbolTables<'a> {
    extractor: &'a SymbolExtractor,
    file_path: &'a Path,
    contents: &'a BTreeMap<TaskId, FileVersions>,
    cache: BTreeMap<(TaskId, Version), Option<SymbolTable>>,
}

impl<'a> SymbolTables<'a> {
    #[must_use]
    pub const fn new(extractor: &'a SymbolExtractor, input: &DetectionInput<'a>) -> Self {
        Self {
            extractor,
            file_path: input.file_path,
            contents: input.task_file_contents,
            cache: BTreeMap::new(),
        }
    }

    /// The table for `task`'s `version`, building it on first access.
    pub fn get(&mut self, task: &TaskId, version: Version) -> Option<&SymbolTable> {
        self.ensure(task, version);
        self.cache.get(&(task.clone(), version))?.as_ref()
    }

    /// Both of `task`'s tables, or `None` if either is unavailable.
    pub fn pair(&mut self, task: &TaskId) -> Option<(&SymbolTable, &SymbolTable)> {
        self.ensure(task, Version::Before);
        self.ensure(task, Version::After);
        let before = self.cache.get(&(task.clone(), Version::Before))?.as_ref()?;
        let after = self.cache.get(&(task.clone(), Version::After))?.as_ref()?;
        Some((before, after))
    }

    /// Number of (task, version) builds attempted so far.
    #[must_use]
    pub fn built(&self) -> usize {
        self.cache.len()
    }

    fn ensure(&mut self, task: &TaskId, version: Version) {
        let key = (task.clone(), version);
        if self.cache.contains_key(&key) {
            return;
        }
        let table = match self.contents.get(task) {
            Some(versions) => {
                let text = match version {
                    Version::Before => &versions.before,
                    Version::After => &versions.after,
                };
                self.extractor.extract(self.file_path, text)
            }
            None => {
                tracing::debug!(task = %task, "no file contents; skipping");
                None
            }
        };
        if table.is_none() {
            tracing::debug!(task = %task, %version, "no symbol table for task version");
        }
        self.cache.insert(key, table);
    }
}

/// Render line numbers as `5, 9`.
pub(crate) fn format_lines(lines: &[u32]) -> String {
    lines
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> TaskId {
        TaskId::new(id).unwrap()
    }

    #[test]
    fn input_requires_at_least_one_task() {
        let changes = BTreeMap::new();
        let contents = BTreeMap::new();
        assert!(DetectionInput::new(&changes, &contents).is_none());
    }

    #[test]
    fn input_takes_file_path_from_first_analysis() {
        let mut changes = BTreeMap::new();
        changes.insert(task("b"), FileAnalysis::new("pkg/b.py", vec![]));
        changes.insert(task("a"), FileAnalysis::new("pkg/a.py", vec![]));
        let contents = BTreeMap::new();
        let input = DetectionInput::new(&changes, &contents).unwrap();
        assert_eq!(input.file_path, Path::new("pkg/a.py"));
    }

    #[test]
    fn tables_are_built_once_and_failures_cached() {
        let mut changes = BTreeMap::new();
        changes.insert(task("a"), FileAnalysis::new("app.py", vec![]));
        let mut contents = BTreeMap::new();
        contents.insert(task("a"), FileVersions::new("def f(:\n", "x = 1\n"));
        let input = DetectionInput::new(&changes, &contents).unwrap();
        let extractor = SymbolExtractor::default();
        let mut tables = SymbolTables::new(&extractor, &input);

        assert!(tables.get(&task("a"), Version::After).is_some());
        assert!(tables.get(&task("a"), Version::After).is_some());
        assert_eq!(tables.built(), 1);

        assert!(tables.get(&task("a"), Version::Before).is_none());
        assert!(tables.pair(&task("a")).is_none());
        assert_eq!(tables.built(), 2);
    }

    #[test]
    fn missing_contents_yield_no_table() {
        let mut changes = BTreeMap::new();
        changes.insert(task("a"), FileAnalysis::new("app.py", vec![]));
        let contents = BTreeMap::new();
        let input = DetectionInput::new(&changes, &contents).unwrap();
        let extractor = SymbolExtractor::default();
        let mut tables = SymbolTables::new(&extractor, &input);
        assert!(tables.get(&task("a"), Version::After).is_none());
    }

    #[test]
    fn pair_returns_both_versions() {
        let mut changes = BTreeMap::new();
        changes.insert(task("a"), FileAnalysis::new("app.py", vec![]));
        let mut contents = BTreeMap::new();
        contents.insert(task("a"), FileVersions::new("x = 1\n", "y = 2\n"));
        let input = DetectionInput::new(&changes, &contents).unwrap();
        let extractor = SymbolExtractor::default();
        let mut tables = SymbolTables::new(&extractor, &input);
        let (before, after) = tables.pair(&task("a")).unwrap();
        assert!(before.definition("x").is_some());
        assert!(after.definition("y").is_some());
    }

    #[test]
    fn format_lines_joins_with_commas() {
        assert_eq!(format_lines(&[5, 9]), "5, 9");
        assert_eq!(format_lines(&[3]), "3");
        assert_eq!(format_lines(&[]), "");
    }
}
