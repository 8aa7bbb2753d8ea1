//! Project-file classification.
//!
//! `ninja -t deps` reports every file an object was compiled against,
//! including system and toolchain headers. Only project files belong in the
//! reverse index. The decision is made by [`PathClassifier`], evaluated in a
//! fixed priority order where the first matching rule wins:
//!
//! 1. starts with an include prefix: project file
//! 2. starts with an exclude prefix: not a project file
//! 3. ends with a source/header extension: project file
//! 4. anything else: not a project file
//!
//! Include prefixes beat exclude prefixes, and exclude prefixes beat
//! extensions, so `/usr/include/vector.h` is rejected even though `.h` is
//! an allowed extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Prefix and extension lists driving [`PathClassifier`].
///
/// Deserializable from JSON so the lists can be tuned per project without
/// code changes. Fields missing from the JSON keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub include_prefixes: Vec<String>,
    pub exclude_prefixes: Vec<String>,
    pub extensions: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_owned()).collect();
        Self {
            include_prefixes: owned(&[
                "include/",
                "library/",
                "test/",
                "example/",
                "src/",
                "profiler/",
                "build-ninja/include/",
                "build-ninja/_deps/gtest",
            ]),
            exclude_prefixes: owned(&["/usr/", "/opt/rocm", "/lib/", "/system/"]),
            extensions: owned(&[
                ".cpp", ".hpp", ".h", ".c", ".cc", ".cxx", ".cu", ".hip",
            ]),
        }
    }
}

impl ClassifierConfig {
    /// Reads a classifier configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the file cannot be read
    /// ([`ExtractError::is_io`]) or is not a valid configuration
    /// ([`ExtractError::is_config`]).
    pub fn from_json_file(path: &Path) -> Result<Self, ExtractError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(ExtractError::config)
    }
}

/// Decides whether a dependency path is a tracked project file.
#[derive(Debug, Clone, Default)]
pub struct PathClassifier {
    config: ClassifierConfig,
}

impl PathClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Returns true if `path` should appear in the reverse index.
    pub fn is_project_file(&self, path: &str) -> bool {
        let starts_with_any =
            |prefixes: &[String]| prefixes.iter().any(|p| path.starts_with(p.as_str()));

        if starts_with_any(&self.config.include_prefixes) {
            return true;
        }
        if starts_with_any(&self.config.exclude_prefixes) {
            return false;
        }
        self.config
            .extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
    }
}
