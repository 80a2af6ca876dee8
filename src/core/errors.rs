/*!
# Error System for Katalon Analyzer

Error taxonomy of the analysis engine. File-level failures ([`ParseError`])
are collected and never abort a run; root-level and contract failures are
returned as [`KatalonError`].
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::ArtifactKind;

/// Result type of the analysis engine
pub type KatalonResult<T> = Result<T, KatalonError>;

/// A single project file that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParseError {
    /// Normalized relative path of the offending file
    pub path: String,
    pub kind: ArtifactKind,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<String>, kind: ArtifactKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Engine errors surfaced to the caller
#[derive(Error, Debug)]
pub enum KatalonError {
    #[error("Project not found: {path} ({reason})")]
    ProjectNotFound { path: PathBuf, reason: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Duplicate {kind} path: {path}")]
    DuplicatePath { kind: ArtifactKind, path: String },

    #[error("Empty search query: {query:?}")]
    EmptyQuery { query: String },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Export failed: {0}")]
    Export(#[from] serde_json::Error),
}

impl KatalonError {
    /// Fatal errors abort `analyze`; everything else is per-file noise
    pub fn is_fatal(&self) -> bool {
        !matches!(self, KatalonError::Parse(_))
    }
}

/// A reference to an artifact that is not part of the scanned set.
///
/// Recorded, never raised: project files may point outside the root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// Path of the entity that contains the reference
    pub referrer: String,
    /// Kind of artifact the reference points to
    pub target_kind: ArtifactKind,
    /// Reference text as written
    pub target: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} references unknown {} '{}'",
            self.referrer, self.target_kind, self.target
        )
    }
}
