//! Error types for the ninjadep-extract crate.

use std::backtrace::Backtrace;
use std::fmt;
use std::path::{Path, PathBuf};

/// Error type for dependency mapping construction.
///
/// Only failures that must abort the whole run are represented here: an
/// unreadable build graph, a dependency tool that cannot be run at all, or
/// output that cannot be written. A single object's dependency query
/// failing is handled with `anyhow`, logged, and degrades that object to
/// "no dependencies" instead of surfacing as an `ExtractError`.
#[derive(Debug)]
pub struct ExtractError {
    kind: ExtractErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods instead.
#[derive(Debug)]
pub(crate) enum ExtractErrorKind {
    /// The build graph file could not be read.
    BuildGraphRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The dependency tool could not be run (`<tool> --version` failed).
    ToolUnavailable {
        tool: PathBuf,
        reason: String,
    },
    /// The worker pool for dependency queries could not be created.
    ThreadPool(rayon::ThreadPoolBuildError),
    /// Failed to serialize output to JSON.
    Serialization(serde_json::Error),
    /// Failed to deserialize a configuration file.
    Config(serde_json::Error),
    /// I/O error when writing output.
    Io(std::io::Error),
}

impl ExtractError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: ExtractErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    pub(crate) fn build_graph_read(path: &Path, source: std::io::Error) -> Self {
        Self::new(ExtractErrorKind::BuildGraphRead {
            path: path.to_owned(),
            source,
        })
    }

    pub(crate) fn tool_unavailable(tool: &Path, reason: impl Into<String>) -> Self {
        Self::new(ExtractErrorKind::ToolUnavailable {
            tool: tool.to_owned(),
            reason: reason.into(),
        })
    }

    pub(crate) fn config(err: serde_json::Error) -> Self {
        Self::new(ExtractErrorKind::Config(err))
    }

    /// Returns true if the build graph could not be read.
    pub fn is_build_graph_read(&self) -> bool {
        matches!(self.kind, ExtractErrorKind::BuildGraphRead { .. })
    }

    /// Returns true if the dependency tool could not be run.
    pub fn is_tool_unavailable(&self) -> bool {
        matches!(self.kind, ExtractErrorKind::ToolUnavailable { .. })
    }

    /// Returns true if the worker pool could not be created.
    pub fn is_thread_pool(&self) -> bool {
        matches!(self.kind, ExtractErrorKind::ThreadPool(_))
    }

    /// Returns true if this error is due to serialization failure.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ExtractErrorKind::Serialization(_))
    }

    /// Returns true if a configuration file was malformed.
    pub fn is_config(&self) -> bool {
        matches!(self.kind, ExtractErrorKind::Config(_))
    }

    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ExtractErrorKind::Io(_))
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for ExtractErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractErrorKind::BuildGraphRead { path, source } => {
                write!(f, "failed to read build graph {}: {source}", path.display())
            }
            ExtractErrorKind::ToolUnavailable { tool, reason } => {
                write!(f, "dependency tool {} is not usable: {reason}", tool.display())
            }
            ExtractErrorKind::ThreadPool(err) => {
                write!(f, "failed to start dependency workers: {err}")
            }
            ExtractErrorKind::Serialization(err) => {
                write!(f, "failed to serialize output: {err}")
            }
            ExtractErrorKind::Config(err) => {
                write!(f, "invalid configuration: {err}")
            }
            ExtractErrorKind::Io(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Summary of what happened.
        writeln!(f, "{}", self.kind)?;

        // Backtrace (will be empty unless RUST_BACKTRACE is set).
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ExtractErrorKind::BuildGraphRead { source, .. } => Some(source),
            ExtractErrorKind::ToolUnavailable { .. } => None,
            ExtractErrorKind::ThreadPool(err) => Some(err),
            ExtractErrorKind::Serialization(err) | ExtractErrorKind::Config(err) => Some(err),
            ExtractErrorKind::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ExtractErrorKind::Io(err))
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ExtractErrorKind::Serialization(err))
    }
}

impl From<rayon::ThreadPoolBuildError> for ExtractError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::new(ExtractErrorKind::ThreadPool(err))
    }
}
