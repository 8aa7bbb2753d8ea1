//! Impact queries: which executables does a change set touch.

use std::collections::BTreeSet;

use ninjadep_schemas::{DependencyMapping, FilterMode};
use tracing::{debug, info};

/// Returns the executables affected by `changed_files` that pass `filter`.
///
/// Files absent from the mapping contribute nothing. The result is sorted
/// and free of duplicates.
pub fn query(
    mapping: &DependencyMapping,
    changed_files: &BTreeSet<String>,
    filter: &FilterMode,
) -> Vec<String> {
    let mut affected = BTreeSet::new();
    for file in changed_files {
        let Some(executables) = mapping.executables_for(file) else {
            debug!(%file, "changed file is not in the mapping");
            continue;
        };
        affected.extend(
            executables
                .iter()
                .filter(|exe| filter.accepts(exe))
                .map(String::as_str),
        );
    }

    info!(
        changed = changed_files.len(),
        affected = affected.len(),
        "resolved impacted executables"
    );
    affected.into_iter().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    fn mapping() -> DependencyMapping {
        DependencyMapping::from_file_to_executables(
            BTreeMap::from([
                ("src/a.cpp".to_owned(), set(&["test_x", "test_y"])),
                ("include/b.hpp".to_owned(), set(&["test_x"])),
                ("include/c.hpp".to_owned(), set(&["example_z", "test_y"])),
            ]),
            3,
            0,
        )
    }

    #[test]
    fn test_single_header() {
        assert_eq!(
            query(&mapping(), &set(&["include/b.hpp"]), &FilterMode::All),
            vec!["test_x"]
        );
    }

    /// Executables reached through several files appear once.
    #[test]
    fn test_union_is_deduplicated() {
        assert_eq!(
            query(
                &mapping(),
                &set(&["src/a.cpp", "include/b.hpp"]),
                &FilterMode::test_prefix()
            ),
            vec!["test_x", "test_y"]
        );
    }

    #[test]
    fn test_unknown_file() {
        assert!(query(&mapping(), &set(&["README.md"]), &FilterMode::All).is_empty());
    }

    #[test]
    fn test_empty_change_set() {
        assert!(query(&mapping(), &BTreeSet::new(), &FilterMode::All).is_empty());
    }

    #[test]
    fn test_prefix_drops_non_tests() {
        let changed = set(&["include/c.hpp"]);

        assert_eq!(
            query(&mapping(), &changed, &FilterMode::All),
            vec!["example_z", "test_y"]
        );
        assert_eq!(
            query(&mapping(), &changed, &FilterMode::test_prefix()),
            vec!["test_y"]
        );
    }
}
