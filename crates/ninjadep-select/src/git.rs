//! Changed files between two git revisions.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use tracing::{info, instrument};

use crate::error::SelectError;

/// Lists the files that differ between `from` and `to` in the repository
/// containing `repo_dir`.
///
/// # Errors
///
/// Returns [`SelectError::is_git`] if git cannot be run or exits non-zero.
#[instrument]
pub fn changed_files(
    repo_dir: &Path,
    from: &str,
    to: &str,
) -> Result<BTreeSet<String>, SelectError> {
    let output = Command::new("git")
        .args(["diff", "--name-only", from, to])
        .current_dir(repo_dir)
        .output()
        .map_err(|e| SelectError::git(format!("cannot run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SelectError::git(format!(
            "git diff {from} {to} failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    let files = parse_name_only(&String::from_utf8_lossy(&output.stdout));
    info!(count = files.len(), "collected changed files");
    Ok(files)
}

/// Parses `git diff --name-only` output: one path per non-blank line.
pub fn parse_name_only(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
