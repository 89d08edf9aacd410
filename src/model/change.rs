//! Structural change records and per-task file inputs.
//!
//! These types are produced upstream: a change classifier describes each
//! edit a task made to a file as a [`StructuralChange`], and the orchestrator
//! collects each task's before/after text as [`FileVersions`]. The detectors
//! only read them.
//!
//! # Rename records
//!
//! A [`ChangeKind::RenameFunction`] record stores the new name in `target`
//! and the old name in `previous_name`. Without `previous_name`, the old
//! name is read from a `function:<old>` location.
//!
//! ```json
//! {
//!   "kind": "rename_function",
//!   "target": "bar",
//!   "previous_name": "foo",
//!   "location": "function:foo",
//!   "lines": { "start": 1, "end": 3 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::types::TaskId;

// ---------------------------------------------------------------------------
// ChangeKind
// ---------------------------------------------------------------------------

/// The kind of structural edit a task made.
///
/// Also used on [`ConflictRegion`](super::conflict::ConflictRegion) to tell
/// the orchestrator which class of edit each involved task contributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    AddImport,
    RemoveImport,
    ModifyImport,
    AddFunction,
    RemoveFunction,
    ModifyFunction,
    RenameFunction,
    AddClass,
    RemoveClass,
    ModifyClass,
    AddVariable,
    RemoveVariable,
    ModifyVariable,
    /// Anything the classifier could not place.
    Unknown,
}

impl ChangeKind {
    /// Return the serialized (`snake_case`) name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddImport => "add_import",
            Self::RemoveImport => "remove_import",
            Self::ModifyImport => "modify_import",
            Self::AddFunction => "add_function",
            Self::RemoveFunction => "remove_function",
            Self::ModifyFunction => "modify_function",
            Self::RenameFunction => "rename_function",
            Self::AddClass => "add_class",
            Self::RemoveClass => "remove_class",
            Self::ModifyClass => "modify_class",
            Self::AddVariable => "add_variable",
            Self::RemoveVariable => "remove_variable",
            Self::ModifyVariable => "modify_variable",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LineRange
// ---------------------------------------------------------------------------

/// A 1-indexed, inclusive line range in a task's version of the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    /// First line (1-indexed, inclusive).
    pub start: u32,
    /// Last line (inclusive).
    pub end: u32,
}

impl LineRange {
    /// Create a range, swapping the bounds if they arrive reversed.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Whether `line` falls inside this range.
    #[must_use]
    pub const fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "line {}", self.start)
        } else {
            write!(f, "lines {}-{}", self.start, self.end)
        }
    }
}

// ---------------------------------------------------------------------------
// StructuralChange
// ---------------------------------------------------------------------------

/// One classified edit a task made to the file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralChange {
    /// What kind of edit this is.
    pub kind: ChangeKind,

    /// The affected symbol. For renames this is the NEW name.
    pub target: String,

    /// The symbol's name before the edit. Required for renames; ignored
    /// otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_name: Option<String>,

    /// Scoped location string, e.g. `function:foo` or `import:os`.
    pub location: String,

    /// Where the edit landed.
    #[serde(default)]
    pub lines: LineRange,

    /// Source snippet before the edit, if the classifier captured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_before: Option<String>,

    /// Source snippet after the edit, if the classifier captured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_after: Option<String>,
}

impl StructuralChange {
    /// Create a change record without snippets.
    #[must_use]
    pub fn new(
        kind: ChangeKind,
        target: impl Into<String>,
        location: impl Into<String>,
        lines: LineRange,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            previous_name: None,
            location: location.into(),
            lines,
            content_before: None,
            content_after: None,
        }
    }

    /// Create a function-rename record carrying both names.
    #[must_use]
    pub fn rename_function(old_name: &str, new_name: &str, lines: LineRange) -> Self {
        Self {
            kind: ChangeKind::RenameFunction,
            target: new_name.to_owned(),
            previous_name: Some(old_name.to_owned()),
            location: format!("function:{old_name}"),
            lines,
            content_before: None,
            content_after: None,
        }
    }

    /// Create an import-removal record for `symbol`.
    #[must_use]
    pub fn remove_import(symbol: &str, lines: LineRange) -> Self {
        Self::new(
            ChangeKind::RemoveImport,
            symbol,
            format!("import:{symbol}"),
            lines,
        )
    }

    /// The old name of a renamed function.
    ///
    /// Prefers `previous_name`; records without one fall back to the
    /// `function:<old>` location. Returns `None` for non-rename records and
    /// for renames whose old name cannot be told apart from `target`.
    #[must_use]
    pub fn renamed_from(&self) -> Option<&str> {
        if self.kind != ChangeKind::RenameFunction {
            return None;
        }
        let old = self
            .previous_name
            .as_deref()
            .or_else(|| self.location.strip_prefix("function:"))?;
        (!old.is_empty() && old != self.target).then_some(old)
    }

    /// Attach before/after snippets.
    #[must_use]
    pub fn with_content(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.content_before = Some(before.into());
        self.content_after = Some(after.into());
        self
    }
}

impl fmt::Display for StructuralChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.previous_name) {
            (ChangeKind::RenameFunction, Some(old)) => {
                write!(f, "{} {old} -> {} ({})", self.kind, self.target, self.lines)
            }
            _ => write!(f, "{} {} ({})", self.kind, self.target, self.lines),
        }
    }
}

// ---------------------------------------------------------------------------
// FileAnalysis / FileVersions
// ---------------------------------------------------------------------------

/// All structural changes one task made to one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// Path of the analysed file. All analyses in one detection call describe
    /// the same file.
    pub file_path: PathBuf,

    /// The task's classified edits, in the order the classifier emitted them.
    #[serde(default)]
    pub changes: Vec<StructuralChange>,
}

impl FileAnalysis {
    /// Create an analysis for `file_path`.
    #[must_use]
    pub fn new(file_path: impl Into<PathBuf>, changes: Vec<StructuralChange>) -> Self {
        Self {
            file_path: file_path.into(),
            changes,
        }
    }

    /// Changes of the given kind, in record order.
    pub fn changes_of(&self, kind: ChangeKind) -> impl Iterator<Item = &StructuralChange> {
        self.changes.iter().filter(move |c| c.kind == kind)
    }
}

/// One task's view of the file: the baseline it started from and its result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersions {
    /// File text before the task's edits.
    pub before: String,
    /// File text after the task's edits.
    pub after: String,
}

impl FileVersions {
    /// Create a before/after pair.
    #[must_use]
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

/// Which side of a task's [`FileVersions`] pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {
    Before,
    After,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

// ---------------------------------------------------------------------------
// DetectionRequest
// ---------------------------------------------------------------------------

/// Both detector inputs for one file, bundled for transport (e.g. JSON).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRequest {
    /// Task id → that task's structural changes to the file.
    #[serde(default)]
    pub task_changes: BTreeMap<TaskId, FileAnalysis>,

    /// Task id → that task's before/after text. A task may appear in
    /// `task_changes` without an entry here.
    #[serde(default)]
    pub task_file_contents: BTreeMap<TaskId, FileVersions>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
