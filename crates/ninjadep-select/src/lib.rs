//! Impact queries against a persisted dependency mapping.
//!
//! Given the `file -> {executables}` index produced by `ninjadep-extract`,
//! this crate answers "which executables must be rebuilt or re-run for this
//! change set". Changed files come either from the caller or from
//! `git diff --name-only` between two revisions.
//!
//! ## Usage
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use std::path::Path;
//! use ninjadep_schemas::FilterMode;
//! use ninjadep_select::{load_mapping, query};
//!
//! let mapping = load_mapping(Path::new("enhanced_dependency_mapping.json")).unwrap();
//! let changed = BTreeSet::from(["include/ck/ck.hpp".to_string()]);
//! for exe in query(&mapping, &changed, &FilterMode::test_prefix()) {
//!     println!("{exe}");
//! }
//! ```

mod error;
mod git;
mod load;
mod query;

use std::collections::BTreeSet;
use std::io::Write;

use itertools::Itertools;
use ninjadep_schemas::{DependencyMapping, FilterMode, TestSelection};
use tracing::debug_span;

#[doc(inline)]
pub use crate::error::SelectError;
pub use crate::git::{changed_files, parse_name_only};
pub use crate::load::{load_mapping, read_mapping};
pub use crate::query::query;

/// Default file name for the selection written by `ninjadep select`.
pub const SELECTION_FILENAME: &str = "tests-to-run.json";

/// Builds the test selection for a change set.
pub fn select(
    mapping: &DependencyMapping,
    changed_files: &BTreeSet<String>,
    filter: &FilterMode,
) -> TestSelection {
    let _span = debug_span!("select").entered();
    TestSelection::new(query(mapping, changed_files, filter), changed_files)
}

/// Writes a selection as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Returns [`SelectError::is_serialization`] or [`SelectError::is_io`].
pub fn write_selection(
    selection: &TestSelection,
    mut output: impl Write,
) -> Result<(), SelectError> {
    serde_json::to_writer_pretty(&mut output, selection)?;
    writeln!(output)?;
    Ok(())
}

/// Writes every mapped file with its executables, then the file count.
///
/// # Errors
///
/// Returns any write error.
pub fn write_audit(mapping: &DependencyMapping, mut output: impl Write) -> std::io::Result<()> {
    for (file, executables) in &mapping.file_to_executables {
        writeln!(output, "{file}: {}", executables.iter().join(", "))?;
    }
    writeln!(output, "Total files: {}", mapping.file_to_executables.len())
}

/// Writes an unfiltered impact listing for a change set.
///
/// # Errors
///
/// Returns any write error.
pub fn write_affected(affected: &[String], mut output: impl Write) -> std::io::Result<()> {
    writeln!(output, "Affected executables:")?;
    for exe in affected {
        writeln!(output, "{exe}")?;
    }
    writeln!(output, "Total affected executables: {}", affected.len())
}
