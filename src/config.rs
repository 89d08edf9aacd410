//! Detector configuration (`.semconf.toml`).
//!
//! Defines the typed configuration for semantic conflict detection: which
//! file extensions are analysed, which detectors run, and which annotation
//! tokens count as nullability markers.
//!
//! ```toml
//! [detect]
//! extensions = ["py"]
//! detectors = ["function_rename", "import_removal", "variable_rename", "type_change"]
//! nullability_markers = ["None", "Optional"]
//! ```

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::model::conflict::ConflictKind;

/// Default config file name, looked up in the working directory by the CLI.
pub const CONFIG_FILE_NAME: &str = ".semconf.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
///
/// Missing fields use defaults. Missing file → all defaults (no error).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemconfConfig {
    /// Detection settings.
    #[serde(default)]
    pub detect: DetectConfig,
}

// ---------------------------------------------------------------------------
// DetectConfig
// ---------------------------------------------------------------------------

/// Detection settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectConfig {
    /// File extensions (without the dot) handled by the Python grammar.
    ///
    /// Compared case-insensitively. Files with any other extension yield no
    /// symbol table.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Detectors to run. The run order is fixed regardless of list order.
    #[serde(default = "default_detectors")]
    pub detectors: Vec<ConflictKind>,

    /// Identifier tokens that mark a return annotation as possibly absent.
    #[serde(default = "default_nullability_markers")]
    pub nullability_markers: Vec<String>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            detectors: default_detectors(),
            nullability_markers: default_nullability_markers(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_owned()]
}

fn default_detectors() -> Vec<ConflictKind> {
    vec![
        ConflictKind::FunctionRename,
        ConflictKind::ImportRemoval,
        ConflictKind::VariableRename,
        ConflictKind::TypeChange,
    ]
}

fn default_nullability_markers() -> Vec<String> {
    vec!["None".to_owned(), "Optional".to_owned()]
}

impl DetectConfig {
    /// Whether `path` has one of the configured extensions.
    #[must_use]
    pub fn supports_path(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Whether the detector for `kind` is enabled.
    #[must_use]
    pub fn is_enabled(&self, kind: ConflictKind) -> bool {
        self.detectors.contains(&kind)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<std::path::PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl SemconfConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML or unknown fields,
    ///   returns a [`ConfigError`] with line-level detail.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
