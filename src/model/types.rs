//! Core identifier types.
//!
//! Every task that touched a shared file is named by a [`TaskId`]. Task ids
//! come from the orchestrator, so validation is deliberately loose: anything
//! printable and free of whitespace is accepted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TaskId
// ---------------------------------------------------------------------------

/// A validated task identifier.
///
/// Task ids are 1–128 characters with no whitespace or control characters.
/// Examples: `task-a`, `001-add-auth`, `agent/7`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// The maximum length of a task id.
    pub const MAX_LEN: usize = 128;

    /// Create a new `TaskId` from a string, validating format.
    ///
    /// # Errors
    /// Returns an error if the id is empty, too long, or contains whitespace
    /// or control characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Return the task id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::TaskId,
                value: s.to_owned(),
                reason: "task id must not be empty".to_owned(),
            });
        }
        if s.chars().count() > Self::MAX_LEN {
            return Err(ValidationError {
                kind: ErrorKind::TaskId,
                value: s.to_owned(),
                reason: format!(
                    "task id must be at most {} characters, got {}",
                    Self::MAX_LEN,
                    s.chars().count()
                ),
            });
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError {
                kind: ErrorKind::TaskId,
                value: s.to_owned(),
                reason: "task id must not contain whitespace or control characters".to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TaskId {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Which type failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A [`TaskId`] validation error.
    TaskId,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskId => write!(f, "TaskId"),
        }
    }
}

/// A validation error for model identifier types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    /// What kind of value was being validated.
    pub kind: ErrorKind,
    /// The invalid value.
    pub value: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}: {}", self.kind, self.value, self.reason)
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
