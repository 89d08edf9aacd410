//! semconf library crate: semantic conflict detection.
//!
//! Several tasks edit the same file from a common baseline. Their textual
//! edits may merge cleanly and still break each other: a renamed function
//! another task still calls, an import removed while another task relies on
//! it, a return type that became nullable. This crate builds a symbol table
//! for each task's before/after text and cross-checks them, producing
//! [`ConflictRegion`]s for a merge orchestrator.
//!
//! The `semconf` binary is a thin driver over [`SemanticConflictDetector`];
//! everything it does is reachable from here.

pub mod config;
pub mod detect;
pub mod error;
pub mod model;
pub mod symbols;

pub use config::{DetectConfig, SemconfConfig};
pub use detect::{SemanticConflictDetector, detect_semantic_conflicts};
pub use model::change::{
    ChangeKind, DetectionRequest, FileAnalysis, FileVersions, LineRange, StructuralChange,
};
pub use model::conflict::{
    ConflictDetails, ConflictKind, ConflictRegion, MergeStrategy, SemanticConflict, Severity,
};
pub use model::types::TaskId;
pub use symbols::{SymbolTable, build_symbol_table};
