//! Semantic conflict model: internal findings and the external region type.
//!
//! Detectors emit [`SemanticConflict`]s. The aggregator converts each one into
//! a [`ConflictRegion`], the unit handed to the merge orchestrator.
//!
//! | Type | Audience |
//! |------|----------|
//! | [`SemanticConflict`] | internal; carries typed [`ConflictDetails`] per detector |
//! | [`ConflictRegion`] | external; severity, involved tasks, formatted reason |
//!
//! Semantic conflicts never auto-merge: every region routes to review with
//! [`MergeStrategy::HumanRequired`].
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "file_path": "app.py",
//!   "location": "import:Dict",
//!   "tasks_involved": ["task-a", "task-b"],
//!   "change_types": ["remove_import", "remove_import"],
//!   "severity": "critical",
//!   "can_auto_merge": false,
//!   "merge_strategy": "human_required",
//!   "reason": "[Semantic: import_removal] Task task-a removed import of 'Dict', ..."
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::change::ChangeKind;
use super::types::TaskId;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// How damaging a detected conflict is likely to be.
///
/// Totally ordered: `Critical > High > Medium > Low`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

// ---------------------------------------------------------------------------
// ConflictKind
// ---------------------------------------------------------------------------

/// The class of semantic conflict, one per detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// A function was renamed while another task still calls the old name.
    FunctionRename,
    /// An import was removed while another task still uses the symbol.
    ImportRemoval,
    /// A variable was renamed inconsistently across tasks.
    VariableRename,
    /// A function's return type changed in a way callers may not expect.
    TypeChange,
}

impl ConflictKind {
    /// Return the kind's tag, as used in `[Semantic: <tag>]` reasons.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FunctionRename => "function_rename",
            Self::ImportRemoval => "import_removal",
            Self::VariableRename => "variable_rename",
            Self::TypeChange => "type_change",
        }
    }

    /// The structural change kind reported on the external region.
    #[must_use]
    pub const fn change_kind(self) -> ChangeKind {
        match self {
            Self::FunctionRename => ChangeKind::RenameFunction,
            Self::ImportRemoval => ChangeKind::RemoveImport,
            Self::VariableRename => ChangeKind::ModifyVariable,
            Self::TypeChange => ChangeKind::ModifyFunction,
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConflictDetails
// ---------------------------------------------------------------------------

/// Detector-specific payload of a [`SemanticConflict`].
///
/// The variant determines the conflict's [`ConflictKind`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "detail", rename_all = "snake_case")]
pub enum ConflictDetails {
    /// A caller still uses a renamed function's old name.
    FunctionRename {
        old_name: String,
        new_name: String,
        /// Lines of the stale calls in the calling task's version.
        call_lines: Vec<u32>,
    },

    /// A task reads a symbol whose import another task removed.
    ImportRemoval {
        symbol: String,
        /// Lines where the relying task reads the symbol.
        usage_lines: Vec<u32>,
    },

    /// A function's return annotation changed.
    TypeChange {
        function: String,
        old_type: String,
        new_type: String,
    },
}

impl ConflictDetails {
    /// The conflict class this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> ConflictKind {
        match self {
            Self::FunctionRename { .. } => ConflictKind::FunctionRename,
            Self::ImportRemoval { .. } => ConflictKind::ImportRemoval,
            Self::TypeChange { .. } => ConflictKind::TypeChange,
        }
    }
}

// ---------------------------------------------------------------------------
// SemanticConflict
// ---------------------------------------------------------------------------

/// One detected semantic issue, before formatting for the orchestrator.
///
/// Always names at least one task. Cross-task conflicts name exactly two:
/// the task that made the structural change first, then the task whose usage
/// collides with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticConflict {
    /// Path of the analysed file.
    pub file_path: PathBuf,
    /// Scoped location, e.g. `function:foo` or `import:Dict`.
    pub location: String,
    /// Involved tasks, change-maker first.
    pub tasks: Vec<TaskId>,
    /// Human-readable explanation.
    pub description: String,
    /// Approximate 1-indexed line of the conflict (0 if unknown).
    pub line: u32,
    pub severity: Severity,
    /// Optional advice for the resolver.
    pub suggestion: Option<String>,
    pub details: ConflictDetails,
}

impl SemanticConflict {
    /// The conflict class, derived from the details payload.
    #[must_use]
    pub const fn kind(&self) -> ConflictKind {
        self.details.kind()
    }

    /// Format the externally visible reason:
    /// `[Semantic: <kind>] <description>[ Suggestion: <suggestion>]`.
    #[must_use]
    pub fn reason(&self) -> String {
        let mut reason = format!("[Semantic: {}] {}", self.kind(), self.description);
        if let Some(suggestion) = &self.suggestion {
            reason.push_str(" Suggestion: ");
            reason.push_str(suggestion);
        }
        reason
    }
}

impl fmt::Display for SemanticConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tasks: Vec<_> = self.tasks.iter().map(TaskId::as_str).collect();
        write!(
            f,
            "{} {} at {}:{} [{}]",
            self.severity,
            self.kind(),
            self.file_path.display(),
            self.location,
            tasks.join(", ")
        )
    }
}

// ---------------------------------------------------------------------------
// ConflictRegion
// ---------------------------------------------------------------------------

/// How the orchestrator should merge a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// A human (or AI resolver) must decide.
    HumanRequired,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HumanRequired => write!(f, "human_required"),
        }
    }
}

/// A flagged conflict region, owned by the merge orchestrator once returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRegion {
    pub file_path: PathBuf,
    pub location: String,
    pub tasks_involved: Vec<TaskId>,
    /// One entry per involved task.
    pub change_types: Vec<ChangeKind>,
    pub severity: Severity,
    /// Always `false` for semantic conflicts.
    pub can_auto_merge: bool,
    pub merge_strategy: MergeStrategy,
    /// `[Semantic: <kind>] ...` explanation.
    pub reason: String,
}

impl ConflictRegion {
    /// Return the semantic conflict tag embedded in the reason, if any.
    #[must_use]
    pub fn semantic_tag(&self) -> Option<&str> {
        let rest = self.reason.strip_prefix("[Semantic: ")?;
        rest.split_once(']').map(|(tag, _)| tag)
    }
}

impl From<SemanticConflict> for ConflictRegion {
    fn from(conflict: SemanticConflict) -> Self {
        let reason = conflict.reason();
        let change_types = vec![conflict.kind().change_kind(); conflict.tasks.len()];
        Self {
            file_path: conflict.file_path,
            location: conflict.location,
            tasks_involved: conflict.tasks,
            change_types,
            severity: conflict.severity,
            can_auto_merge: false,
            merge_strategy: MergeStrategy::HumanRequired,
            reason,
        }
    }
}

impl fmt::Display for ConflictRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tasks: Vec<_> = self.tasks_involved.iter().map(TaskId::as_str).collect();
        write!(
            f,
            "{} {}:{} [{}] {}",
            self.severity,
            self.file_path.display(),
            self.location,
            tasks.join(", "),
            self.reason
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
