//! Impact query schema.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Naming prefix used by `--test-prefix` to keep only test executables.
pub const TEST_PREFIX: &str = "test_";

/// Which affected executables an impact query keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Keep every affected executable.
    #[default]
    All,
    /// Keep executables whose id, or the last `/` component of it, starts
    /// with the given prefix. `bin/test_foo` matches `test_`.
    Prefix(String),
}

impl FilterMode {
    /// The filter behind `--test-prefix`.
    pub fn test_prefix() -> Self {
        Self::Prefix(TEST_PREFIX.to_owned())
    }

    /// Returns true if `executable` passes the filter.
    pub fn accepts(&self, executable: &str) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Prefix(prefix) => {
                let name = executable.rsplit('/').next().unwrap_or(executable);
                executable.starts_with(prefix.as_str()) || name.starts_with(prefix.as_str())
            }
        }
    }
}

/// Output of `ninjadep select`, written as `tests-to-run.json`.
///
/// Both lists are sorted and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSelection {
    pub tests_to_run: Vec<String>,
    pub changed_files: Vec<String>,
}

impl TestSelection {
    pub fn new(tests_to_run: Vec<String>, changed_files: &BTreeSet<String>) -> Self {
        Self {
            tests_to_run,
            changed_files: changed_files.iter().cloned().collect(),
        }
    }
}
