//! Run every enabled detector over one file and emit conflict regions.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::DetectConfig;
use crate::model::change::{DetectionRequest, FileAnalysis, FileVersions};
use crate::model::conflict::{ConflictKind, ConflictRegion, SemanticConflict};
use crate::model::types::TaskId;
use crate::symbols::SymbolExtractor;

use super::{
    DetectionInput, FunctionRenameDetector, ImportRemovalDetector, ReturnTypeDetector,
    SemanticDetector, SymbolTables, VariableRenameDetector,
};

/// The full semantic pass: rename, import removal, variable rename, and
/// return type, always in that order.
///
/// Holds no per-call state. Symbol tables are built fresh on every call, so
/// one detector can serve concurrent calls.
pub struct SemanticConflictDetector {
    extractor: SymbolExtractor,
    detectors: Vec<Box<dyn SemanticDetector + Send + Sync>>,
}

impl Default for SemanticConflictDetector {
    fn default() -> Self {
        Self::new(&DetectConfig::default())
    }
}

impl fmt::Debug for SemanticConflictDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticConflictDetector")
            .field("extractor", &self.extractor)
            .field("detectors", &self.detector_kinds())
            .finish()
    }
}

impl SemanticConflictDetector {
    /// Build the detector set enabled by `config`.
    #[must_use]
    pub fn new(config: &DetectConfig) -> Self {
        let all: Vec<Box<dyn SemanticDetector + Send + Sync>> = vec![
            Box::new(FunctionRenameDetector),
            Box::new(ImportRemovalDetector),
            Box::new(VariableRenameDetector),
            Box::new(ReturnTypeDetector::new(config)),
        ];
        Self {
            extractor: SymbolExtractor::new(config),
            detectors: all
                .into_iter()
                .filter(|d| config.is_enabled(d.kind()))
                .collect(),
        }
    }

    /// Kinds of the detectors that will run, in run order.
    #[must_use]
    pub fn detector_kinds(&self) -> Vec<ConflictKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    /// Run all detectors and return the raw findings.
    ///
    /// Ordered by detector, then by discovery order within each detector.
    #[must_use]
    pub fn detect_conflicts(
        &self,
        task_changes: &BTreeMap<TaskId, FileAnalysis>,
        task_file_contents: &BTreeMap<TaskId, FileVersions>,
    ) -> Vec<SemanticConflict> {
        let Some(input) = DetectionInput::new(task_changes, task_file_contents) else {
            return Vec::new();
        };

        let _span = tracing::debug_span!(
            "semantic_detect",
            file = %input.file_path.display(),
            tasks = task_changes.len(),
        )
        .entered();

        let mut tables = SymbolTables::new(&self.extractor, &input);
        let mut conflicts = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(&input, &mut tables);
            tracing::debug!(kind = %detector.kind(), found = found.len(), "detector finished");
            conflicts.extend(found);
        }

        tracing::debug!(
            conflicts = conflicts.len(),
            tables = tables.built(),
            "semantic detection finished"
        );
        conflicts
    }

    /// Run all detectors and convert each finding into a [`ConflictRegion`].
    #[must_use]
    pub fn detect(
        &self,
        task_changes: &BTreeMap<TaskId, FileAnalysis>,
        task_file_contents: &BTreeMap<TaskId, FileVersions>,
    ) -> Vec<ConflictRegion> {
        self.detect_conflicts(task_changes, task_file_contents)
            .into_iter()
            .map(ConflictRegion::from)
            .collect()
    }

    /// [`detect`](Self::detect) over a bundled request.
    #[must_use]
    pub fn detect_request(&self, request: &DetectionRequest) -> Vec<ConflictRegion> {
        self.detect(&request.task_changes, &request.task_file_contents)
    }
}

/// Detect semantic conflicts with the default configuration.
#[must_use]
pub fn detect_semantic_conflicts(
    task_changes: &BTreeMap<TaskId, FileAnalysis>,
    task_file_contents: &BTreeMap<TaskId, FileVersions>,
) -> Vec<ConflictRegion> {
    SemanticConflictDetector::default().detect(task_changes, task_file_contents)
}
