//! Return types that became nullable.
//!
//! Compares each task's before/after annotations function by function. Only
//! one transition is flagged: the new annotation gained a nullability marker
//! (`None`, `Optional`, ...) the old one lacked. Callers written against the
//! old type may dereference the result unguarded.
//!
//! Comparison is textual. `int | None` and `None | int` differ, and a marker
//! inside a nested generic counts the same as a top-level one.

use crate::config::DetectConfig;
use crate::model::conflict::{ConflictDetails, ConflictKind, SemanticConflict, Severity};

use super::{DetectionInput, SemanticDetector, SymbolTables};

/// Flags return annotations that gained a nullability marker.
#[derive(Clone, Debug)]
pub struct ReturnTypeDetector {
    markers: Vec<String>,
}

impl Default for ReturnTypeDetector {
    fn default() -> Self {
        Self::new(&DetectConfig::default())
    }
}

impl ReturnTypeDetector {
    /// Use `config.nullability_markers` as the marker tokens.
    #[must_use]
    pub fn new(config: &DetectConfig) -> Self {
        Self {
            markers: config.nullability_markers.clone(),
        }
    }

    /// Whether `new` carries a marker `old` lacks.
    fn gains_marker(&self, old: &str, new: &str) -> bool {
        self.markers
            .iter()
            .any(|m| has_token(new, m) && !has_token(old, m))
    }
}

impl SemanticDetector for ReturnTypeDetector {
    fn kind(&self) -> ConflictKind {
        ConflictKind::TypeChange
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        tables: &mut SymbolTables<'_>,
    ) -> Vec<SemanticConflict> {
        let mut conflicts = Vec::new();
        for task in input.checked_tasks() {
            let Some((before, after)) = tables.pair(task) else {
                continue;
            };
            for (function, new_type) in after.function_signatures() {
                let Some(old_type) = before.return_type(function) else {
                    continue;
                };
                let new_type = new_type.as_deref();
                if old_type == new_type {
                    continue;
                }
                let (Some(old_type), Some(new_type)) = (old_type, new_type) else {
                    tracing::debug!(
                        task = %task,
                        function = %function,
                        ?old_type,
                        ?new_type,
                        "return annotation added or removed; not flagged"
                    );
                    continue;
                };
                if !self.gains_marker(old_type, new_type) {
                    tracing::debug!(
                        task = %task,
                        function = %function,
                        old_type,
                        new_type,
                        "return type changed without gaining a nullability marker"
                    );
                    continue;
                }

                conflicts.push(SemanticConflict {
                    file_path: input.file_path.to_path_buf(),
                    location: format!("function:{function}"),
                    tasks: vec![task.clone()],
                    description: format!(
                        "Task {task} changed return type of '{function}' from '{old_type}' to \
                         '{new_type}' (now possibly None). This may break callers that don't \
                         handle None."
                    ),
                    line: after.definition(function).map_or(0, |d| d.line),
                    severity: Severity::Medium,
                    suggestion: Some(format!(
                        "Review all callers of '{function}' to ensure they handle None"
                    )),
                    details: ConflictDetails::TypeChange {
                        function: function.clone(),
                        old_type: old_type.to_owned(),
                        new_type: new_type.to_owned(),
                    },
                });
            }
        }
        conflicts
    }
}

/// Whether `token` appears in `text` as a whole identifier.
fn has_token(text: &str, token: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|t| t == token)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::change::{ChangeKind, FileAnalysis, FileVersions, LineRange, StructuralChange};
    use crate::model::types::TaskId;
    use crate::symbols::SymbolExtractor;

    fn task(id: &str) -> TaskId {
        TaskId::new(id).unwrap()
    }

    fn run_with(detector: &ReturnTypeDetector, before: &str, after: &str) -> Vec<SemanticConflict> {
        let mut changes = BTreeMap::new();
        changes.insert(
            task("task-a"),
            FileAnalysis::new(
                "test.py",
                vec![StructuralChange::new(
                    ChangeKind::ModifyFunction,
                    "get_user",
                    "function:get_user",
                    LineRange::new(1, 3),
                )],
            ),
        );
        let mut contents = BTreeMap::new();
        contents.insert(task("task-a"), FileVersions::new(before, after));
        let input = DetectionInput::new(&changes, &contents).unwrap();
        let extractor = SymbolExtractor::default();
        let mut tables = SymbolTables::new(&extractor, &input);
        detector.detect(&input, &mut tables)
    }

    fn run(before: &str, after: &str) -> Vec<SemanticConflict> {
        run_with(&ReturnTypeDetector::default(), before, after)
    }

    #[test]
    fn adding_none_to_return_type_conflicts() {
        let conflicts = run(
            "def get_user() -> User:\n    return User()\n",
            "\n\ndef get_user() -> User | None:\n    return None\n",
        );
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.kind(), ConflictKind::TypeChange);
        assert_eq!(c.severity, Severity::Medium);
        assert_eq!(c.tasks, vec![task("task-a")]);
        assert_eq!(c.location, "function:get_user");
        assert_eq!(c.line, 3);
        assert!(c.description.contains("None"));
        assert!(c.description.contains("from 'User' to 'User | None'"));
    }

    #[test]
    fn optional_wrapper_counts_as_marker() {
        let conflicts = run(
            "def get_user() -> User:\n    pass\n",
            "def get_user() -> Optional[User]:\n    pass\n",
        );
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn narrowing_is_not_flagged() {
        let conflicts = run(
            "def get_user() -> User | None:\n    pass\n",
            "def get_user() -> User:\n    pass\n",
        );
        assert!(conflicts.is_empty());
    }

    #[test]
    fn unrelated_substitution_is_not_flagged() {
        assert!(run("def f() -> int:\n    pass\n", "def f() -> str:\n    pass\n").is_empty());
    }

    #[test]
    fn adding_an_annotation_is_not_flagged() {
        assert!(run("def f():\n    pass\n", "def f() -> int | None:\n    pass\n").is_empty());
    }

    #[test]
    fn marker_must_be_a_whole_token() {
        assert!(
            run(
                "def f() -> Node:\n    pass\n",
                "def f() -> NoneType | Node:\n    pass\n",
            )
            .is_empty()
        );
    }

    #[test]
    fn new_function_is_not_compared() {
        assert!(run("", "def f() -> int | None:\n    pass\n").is_empty());
    }

    #[test]
    fn custom_markers() {
        let config = DetectConfig {
            nullability_markers: vec!["Maybe".to_owned()],
            ..DetectConfig::default()
        };
        let detector = ReturnTypeDetector::new(&config);
        assert_eq!(
            run_with(&detector, "def f() -> int:\n    pass\n", "def f() -> Maybe[int]:\n    pass\n").len(),
            1
        );
        assert!(
            run_with(&detector, "def f() -> int:\n    pass\n", "def f() -> int | None:\n    pass\n")
                .is_empty()
        );
    }

    #[test]
    fn unparseable_version_is_skipped() {
        assert!(run("def get_user( -> User:\n", "def get_user() -> User | None:\n    pass\n").is_empty());
    }

    #[test]
    fn has_token_matches_identifiers_only() {
        assert!(has_token("Optional[User]", "Optional"));
        assert!(has_token("int | None", "None"));
        assert!(!has_token("NoneType", "None"));
        assert!(!has_token("MyOptional", "Optional"));
    }
}
