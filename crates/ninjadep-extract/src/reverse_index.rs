//! Reverse index construction.
//!
//! Inverts the forward relations (executable -> objects -> dependencies)
//! into `file -> {executables}`, keeping only project files. The result
//! depends only on the input contents, never on iteration order, since
//! every insertion is a set union.

use ninjadep_schemas::{DependencyMapping, FileToExecutables};
use tracing::{debug, debug_span, info};

use crate::build_graph::BuildGraph;
use crate::classify::PathClassifier;
use crate::deps::ObjectDependencies;

/// Builds the dependency mapping for `graph`.
///
/// An object with no entry in `dependencies` (never queried, or its query
/// failed) contributes nothing to its executables.
pub fn build_mapping(
    graph: &BuildGraph,
    dependencies: &ObjectDependencies,
    classifier: &PathClassifier,
) -> DependencyMapping {
    let _span = debug_span!("build_mapping").entered();
    let mut file_to_executables = FileToExecutables::new();

    for (executable, objects) in &graph.executables {
        for object in objects {
            let Some(deps) = dependencies.get(object) else {
                debug!(%executable, %object, "object has no recorded dependencies");
                continue;
            };
            for dep in deps.iter().filter(|dep| classifier.is_project_file(dep)) {
                file_to_executables
                    .entry(dep.clone())
                    .or_default()
                    .insert(executable.clone());
            }
        }
    }

    let mapping = DependencyMapping::from_file_to_executables(
        file_to_executables,
        graph.executables.len(),
        graph.object_sources.len(),
    );
    info!(
        files = mapping.statistics.total_files,
        shared = mapping.statistics.files_with_multiple_executables,
        "built file-to-executable mapping"
    );
    mapping
}
