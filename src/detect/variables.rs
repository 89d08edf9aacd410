//! Variable renames.
//!
//! Placeholder pass: it never reports anything. Catching a variable renamed
//! in one task but still read under its old name in another needs scope-aware
//! resolution the symbol tables do not provide, since they key every name
//! globally per file.

use crate::model::conflict::{ConflictKind, SemanticConflict};

use super::{DetectionInput, SemanticDetector, SymbolTables};

/// Always returns no conflicts.
#[derive(Clone, Copy, Debug, Default)]
pub struct VariableRenameDetector;

impl SemanticDetector for VariableRenameDetector {
    fn kind(&self) -> ConflictKind {
        ConflictKind::VariableRename
    }

    fn detect(
        &self,
        _input: &DetectionInput<'_>,
        _tables: &mut SymbolTables<'_>,
    ) -> Vec<SemanticConflict> {
        Vec::new()
    }
}
