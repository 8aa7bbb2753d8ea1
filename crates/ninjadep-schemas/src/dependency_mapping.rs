//! Reverse dependency index schema.
//!
//! A [`DependencyMapping`] answers "which executables depend on this file?".
//! It is built once from a ninja build graph and persisted as JSON:
//!
//! ```json
//! {
//!   "file_to_executables": { "include/b.hpp": ["bin/test_x"] },
//!   "executable_to_files": { "bin/test_x": ["include/b.hpp"] },
//!   "statistics": {
//!     "total_files": 1,
//!     "total_executables": 1,
//!     "total_object_files": 2,
//!     "files_with_multiple_executables": 0
//!   }
//! }
//! ```
//!
//! Older mappings consisted of the bare `file_to_executables` object only;
//! [`MappingDocument`] accepts both shapes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Map from a project file to the executables that depend on it.
pub type FileToExecutables = BTreeMap<String, BTreeSet<String>>;

/// Map from an executable to the project files it depends on.
pub type ExecutableToFiles = BTreeMap<String, BTreeSet<String>>;

/// Summary counters stored alongside the mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingStatistics {
    /// Number of distinct files in `file_to_executables`.
    pub total_files: usize,
    /// Number of executables found in the build graph, including those
    /// that ended up with no tracked files.
    pub total_executables: usize,
    /// Number of compiled objects found in the build graph.
    pub total_object_files: usize,
    /// Number of files used by more than one executable.
    pub files_with_multiple_executables: usize,
}

/// The persisted reverse dependency index.
///
/// `file_to_executables` is authoritative. `executable_to_files` is its
/// exact inverse and is always derived from it, never edited on its own;
/// use [`DependencyMapping::from_file_to_executables`] to construct one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyMapping {
    pub file_to_executables: FileToExecutables,
    pub executable_to_files: ExecutableToFiles,
    pub statistics: MappingStatistics,
}

impl DependencyMapping {
    /// Builds a mapping from the forward `file -> executables` index.
    ///
    /// Derives the inverse index and fills in the file-derived statistics.
    /// The executable and object counts come from the build graph and are
    /// passed in, since executables without any tracked file do not appear
    /// in either index.
    pub fn from_file_to_executables(
        file_to_executables: FileToExecutables,
        total_executables: usize,
        total_object_files: usize,
    ) -> Self {
        let executable_to_files = invert(&file_to_executables);
        let files_with_multiple_executables = file_to_executables
            .values()
            .filter(|exes| exes.len() > 1)
            .count();

        let statistics = MappingStatistics {
            total_files: file_to_executables.len(),
            total_executables,
            total_object_files,
            files_with_multiple_executables,
        };

        Self {
            file_to_executables,
            executable_to_files,
            statistics,
        }
    }

    /// Returns the executables that depend on `file`, if it is tracked.
    pub fn executables_for(&self, file: &str) -> Option<&BTreeSet<String>> {
        self.file_to_executables.get(file)
    }

    /// Returns the files that `executable` depends on, if it is tracked.
    pub fn files_for(&self, executable: &str) -> Option<&BTreeSet<String>> {
        self.executable_to_files.get(executable)
    }

    /// Returns true if the two indexes are exact inverses of each other.
    pub fn is_consistent(&self) -> bool {
        self.executable_to_files == invert(&self.file_to_executables)
    }
}

/// Inverts a `key -> {values}` index into `value -> {keys}`.
fn invert(index: &BTreeMap<String, BTreeSet<String>>) -> BTreeMap<String, BTreeSet<String>> {
    let mut inverse: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, values) in index {
        for value in values {
            inverse
                .entry(value.clone())
                .or_default()
                .insert(key.clone());
        }
    }
    inverse
}

/// Any on-disk shape a dependency mapping may take.
///
/// The full shape is tried first. A document lacking the
/// `file_to_executables` key is read as the legacy bare index.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MappingDocument {
    Full(PersistedMapping),
    Bare(FileToExecutables),
}

/// The full on-disk shape. Only `file_to_executables` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistedMapping {
    pub file_to_executables: FileToExecutables,
    #[serde(default)]
    pub statistics: Option<MappingStatistics>,
}

impl MappingDocument {
    /// Normalizes either shape into a consistent [`DependencyMapping`].
    ///
    /// The inverse index is always re-derived. Stored statistics are kept
    /// when present; otherwise they are recomputed from the maps, with the
    /// object count unknown (zero).
    pub fn into_mapping(self) -> DependencyMapping {
        let (file_to_executables, statistics) = match self {
            MappingDocument::Full(persisted) => {
                (persisted.file_to_executables, persisted.statistics)
            }
            MappingDocument::Bare(file_to_executables) => {
                (file_to_executables, None)
            }
        };

        let mut mapping =
            DependencyMapping::from_file_to_executables(file_to_executables, 0, 0);
        match statistics {
            Some(stored) => mapping.statistics = stored,
            None => {
                mapping.statistics.total_executables =
                    mapping.executable_to_files.len();
            }
        }
        mapping
    }
}
