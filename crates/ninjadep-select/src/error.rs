//! Error types for the ninjadep-select crate.

use std::backtrace::Backtrace;
use std::fmt;
use std::path::{Path, PathBuf};

/// Error type for impact queries.
///
/// Use the `is_xxx()` methods to classify the failure.
#[derive(Debug)]
pub struct SelectError {
    kind: SelectErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods instead.
#[derive(Debug)]
pub(crate) enum SelectErrorKind {
    /// The mapping file could not be opened or read.
    MappingRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The mapping is not valid JSON in either accepted shape.
    Deserialization(serde_json::Error),
    /// `git diff` could not be run or exited non-zero.
    Git { reason: String },
    /// Failed to serialize output to JSON.
    Serialization(serde_json::Error),
    /// I/O error when writing output.
    Io(std::io::Error),
}

impl SelectError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: SelectErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    pub(crate) fn mapping_read(path: &Path, source: std::io::Error) -> Self {
        Self::new(SelectErrorKind::MappingRead {
            path: path.to_owned(),
            source,
        })
    }

    pub(crate) fn deserialization(err: serde_json::Error) -> Self {
        Self::new(SelectErrorKind::Deserialization(err))
    }

    pub(crate) fn git(reason: impl Into<String>) -> Self {
        Self::new(SelectErrorKind::Git {
            reason: reason.into(),
        })
    }

    /// Returns true if the mapping file could not be read.
    pub fn is_mapping_read(&self) -> bool {
        matches!(self.kind, SelectErrorKind::MappingRead { .. })
    }

    /// Returns true if the mapping could not be parsed.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, SelectErrorKind::Deserialization(_))
    }

    /// Returns true if the changed-file list could not be obtained from git.
    pub fn is_git(&self) -> bool {
        matches!(self.kind, SelectErrorKind::Git { .. })
    }

    /// Returns true if this error is due to serialization failure.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, SelectErrorKind::Serialization(_))
    }

    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, SelectErrorKind::Io(_))
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for SelectErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectErrorKind::MappingRead { path, source } => {
                write!(f, "failed to read dependency mapping {}: {source}", path.display())
            }
            SelectErrorKind::Deserialization(err) => {
                write!(f, "failed to parse dependency mapping: {err}")
            }
            SelectErrorKind::Git { reason } => {
                write!(f, "failed to list changed files: {reason}")
            }
            SelectErrorKind::Serialization(err) => {
                write!(f, "failed to serialize output: {err}")
            }
            SelectErrorKind::Io(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;

        // Empty unless RUST_BACKTRACE is set.
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for SelectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            SelectErrorKind::MappingRead { source, .. } => Some(source),
            SelectErrorKind::Deserialization(err) | SelectErrorKind::Serialization(err) => {
                Some(err)
            }
            SelectErrorKind::Git { .. } => None,
            SelectErrorKind::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SelectError {
    fn from(err: std::io::Error) -> Self {
        Self::new(SelectErrorKind::Io(err))
    }
}

impl From<serde_json::Error> for SelectError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(SelectErrorKind::Serialization(err))
    }
}
