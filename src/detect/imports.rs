//! Removed imports another task still relies on.
//!
//! Task A drops `from typing import Dict`; task B adds code annotated with
//! `Dict[str, int]` and never imports it, because the baseline already did.
//! Merging both leaves B's code with an unbound name.

use crate::model::change::{ChangeKind, Version};
use crate::model::conflict::{ConflictDetails, ConflictKind, SemanticConflict, Severity};
use crate::model::types::TaskId;

use super::{DetectionInput, SemanticDetector, SymbolTables, format_lines};

/// Flags tasks that read a symbol whose import another task removed.
///
/// A removed import nobody else reads is fine. So is one the reading task
/// imports itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImportRemovalDetector;

impl SemanticDetector for ImportRemovalDetector {
    fn kind(&self) -> ConflictKind {
        ConflictKind::ImportRemoval
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        tables: &mut SymbolTables<'_>,
    ) -> Vec<SemanticConflict> {
        let removals = collect_removals(input);
        if removals.is_empty() {
            return Vec::new();
        }

        let mut conflicts = Vec::new();
        for task in input.checked_tasks() {
            let Some(table) = tables.get(task, Version::After) else {
                continue;
            };
            for &(symbol, remover) in &removals {
                if remover == task || table.imports_symbol(symbol) {
                    continue;
                }
                let Some(usage_lines) = table.usages_of(symbol) else {
                    continue;
                };
                conflicts.push(SemanticConflict {
                    file_path: input.file_path.to_path_buf(),
                    location: format!("import:{symbol}"),
                    tasks: vec![remover.clone(), task.clone()],
                    description: format!(
                        "Task {remover} removed import of '{symbol}', but task {task} uses it \
                         at line(s) {} without importing it",
                        format_lines(usage_lines)
                    ),
                    line: usage_lines.first().copied().unwrap_or(0),
                    severity: Severity::Critical,
                    suggestion: Some(format!(
                        "Task {task} should import '{symbol}' explicitly"
                    )),
                    details: ConflictDetails::ImportRemoval {
                        symbol: symbol.to_owned(),
                        usage_lines: usage_lines.to_vec(),
                    },
                });
            }
        }
        conflicts
    }
}

/// `(symbol, removing task)` in task order, then record order.
fn collect_removals<'a>(input: &DetectionInput<'a>) -> Vec<(&'a str, &'a TaskId)> {
    let mut removals = Vec::new();
    for (task, analysis) in input.task_changes {
        for change in analysis.changes_of(ChangeKind::RemoveImport) {
            if change.target.is_empty() {
                tracing::warn!(task = %task, change = %change, "ignoring import removal without a symbol");
                continue;
            }
            removals.push((change.target.as_str(), task));
        }
    }
    removals
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::change::{FileAnalysis, FileVersions, LineRange, StructuralChange};
    use crate::symbols::SymbolExtractor;

    fn task(id: &str) -> TaskId {
        TaskId::new(id).unwrap()
    }

    fn run(
        changes: &BTreeMap<TaskId, FileAnalysis>,
        contents: &BTreeMap<TaskId, FileVersions>,
    ) -> Vec<SemanticConflict> {
        let input = DetectionInput::new(changes, contents).unwrap();
        let extractor = SymbolExtractor::default();
        let mut tables = SymbolTables::new(&extractor, &input);
        ImportRemovalDetector.detect(&input, &mut tables)
    }

    fn removes(symbol: &str) -> FileAnalysis {
        FileAnalysis::new(
            "test.py",
            vec![StructuralChange::remove_import(symbol, LineRange::new(1, 1))],
        )
    }

    #[test]
    fn unused_import_removal_is_not_a_conflict() {
        let mut changes = BTreeMap::new();
        changes.insert(task("task-a"), removes("os"));
        let mut contents = BTreeMap::new();
        contents.insert(
            task("task-a"),
            FileVersions::new(
                "import os\n\ndef foo():\n    return 5\n",
                "def foo():\n    return 5\n",
            ),
        );
        assert!(run(&changes, &contents).is_empty());
    }

    #[test]
    fn removed_import_still_used_elsewhere_conflicts() {
        let mut changes = BTreeMap::new();
        changes.insert(task("task-a"), removes("List"));
        changes.insert(task("task-b"), FileAnalysis::new("test.py", vec![]));
        let mut contents = BTreeMap::new();
        contents.insert(
            task("task-b"),
            FileVersions::new(
                "def foo():\n    return []\n",
                "def foo():\n    return []\n\ndef process(items: List[int]) -> int:\n    return sum(items)\n",
            ),
        );

        let conflicts = run(&changes, &contents);
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.kind(), ConflictKind::ImportRemoval);
        assert_eq!(c.severity, Severity::Critical);
        assert_eq!(c.location, "import:List");
        assert_eq!(c.tasks, vec![task("task-a"), task("task-b")]);
        assert_eq!(c.line, 4);
        assert_eq!(
            c.description,
            "Task task-a removed import of 'List', but task task-b uses it at line(s) 4 without importing it"
        );
        assert_eq!(
            c.suggestion.as_deref(),
            Some("Task task-b should import 'List' explicitly")
        );
    }

    #[test]
    fn task_importing_symbol_itself_is_fine() {
        let mut changes = BTreeMap::new();
        changes.insert(task("task-a"), removes("Dict"));
        let mut contents = BTreeMap::new();
        contents.insert(
            task("task-b"),
            FileVersions::new("", "from typing import Dict\n\nx: Dict[str, int] = {}\n"),
        );
        assert!(run(&changes, &contents).is_empty());
    }

    #[test]
    fn remover_reading_its_own_removal_is_not_cross_task() {
        let mut changes = BTreeMap::new();
        changes.insert(task("task-a"), removes("os"));
        let mut contents = BTreeMap::new();
        contents.insert(task("task-a"), FileVersions::new("import os\n", "os.getcwd()\n"));
        assert!(run(&changes, &contents).is_empty());
    }

    #[test]
    fn duplicate_removals_are_each_reported() {
        let mut changes = BTreeMap::new();
        changes.insert(task("task-a"), removes("os"));
        changes.insert(task("task-b"), removes("os"));
        let mut contents = BTreeMap::new();
        contents.insert(task("task-c"), FileVersions::new("", "os.getcwd()\n"));
        let conflicts = run(&changes, &contents);
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].tasks, vec![task("task-a"), task("task-c")]);
        assert_eq!(conflicts[1].tasks, vec![task("task-b"), task("task-c")]);
    }

    #[test]
    fn task_without_contents_is_only_a_source() {
        let mut changes = BTreeMap::new();
        changes.insert(task("task-a"), removes("os"));
        changes.insert(task("task-b"), FileAnalysis::new("test.py", vec![]));
        let contents = BTreeMap::new();
        assert!(run(&changes, &contents).is_empty());
    }
}
