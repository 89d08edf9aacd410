//! Stale calls to renamed functions.
//!
//! Task A renames `foo` to `bar`; task B's version still calls `foo()`. Once
//! both land, B's call site resolves to nothing.

use crate::model::change::{ChangeKind, Version};
use crate::model::conflict::{ConflictDetails, ConflictKind, SemanticConflict, Severity};
use crate::model::types::TaskId;

use super::{DetectionInput, SemanticDetector, SymbolTables, format_lines};

/// A resolved rename record.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Rename<'a> {
    old_name: &'a str,
    new_name: &'a str,
    task: &'a TaskId,
}

/// Flags tasks that still call a function another task renamed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FunctionRenameDetector;

impl SemanticDetector for FunctionRenameDetector {
    fn kind(&self) -> ConflictKind {
        ConflictKind::FunctionRename
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        tables: &mut SymbolTables<'_>,
    ) -> Vec<SemanticConflict> {
        let renames = collect_renames(input);
        if renames.is_empty() {
            return Vec::new();
        }

        let mut conflicts = Vec::new();
        for task in input.checked_tasks() {
            let Some(table) = tables.get(task, Version::After) else {
                continue;
            };
            for rename in &renames {
                if rename.task == task {
                    continue;
                }
                let Some(call_lines) = table.calls_to(rename.old_name) else {
                    continue;
                };
                conflicts.push(stale_call(input, rename, task, call_lines));
            }
        }
        conflicts
    }
}

fn collect_renames<'a>(input: &DetectionInput<'a>) -> Vec<Rename<'a>> {
    let mut renames = Vec::new();
    for (task, analysis) in input.task_changes {
        for change in analysis.changes_of(ChangeKind::RenameFunction) {
            match change.renamed_from() {
                Some(old_name) => renames.push(Rename {
                    old_name,
                    new_name: &change.target,
                    task,
                }),
                None => {
                    tracing::warn!(
                        task = %task,
                        change = %change,
                        "ignoring rename record without a distinct previous name"
                    );
                }
            }
        }
    }
    renames
}

fn stale_call(
    input: &DetectionInput<'_>,
    rename: &Rename<'_>,
    caller: &TaskId,
    call_lines: &[u32],
) -> SemanticConflict {
    let Rename {
        old_name,
        new_name,
        task,
    } = rename;
    SemanticConflict {
        file_path: input.file_path.to_path_buf(),
        location: format!("function:{old_name}"),
        tasks: vec![(*task).clone(), caller.clone()],
        description: format!(
            "Task {task} renamed function '{old_name}' to '{new_name}', but task {caller} \
             still calls '{old_name}' at line(s) {}",
            format_lines(call_lines)
        ),
        line: call_lines.first().copied().unwrap_or(0),
        severity: Severity::High,
        suggestion: Some(format!(
            "Update function calls from '{old_name}' to '{new_name}' in task {caller}"
        )),
        details: ConflictDetails::FunctionRename {
            old_name: (*old_name).to_owned(),
            new_name: (*new_name).to_owned(),
            call_lines: call_lines.to_vec(),
        },
    }
}
