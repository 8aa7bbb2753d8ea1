//! Reverse dependency index construction from ninja build graphs.
//!
//! The pipeline has four stages:
//!
//! 1. [`BuildGraph`] parses `build.ninja` into executable -> objects and
//!    object -> source relations.
//! 2. [`extract_dependencies`] asks `ninja -t deps` for every object's
//!    full dependency list, concurrently and tolerating per-object failure.
//! 3. [`PathClassifier`] keeps project files and drops system headers.
//! 4. [`build_mapping`] inverts everything into a [`DependencyMapping`]
//!    (`file -> {executables}`).
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use ninjadep_extract::{ExtractConfig, run};
//!
//! let extraction = run(Path::new("build-ninja/build.ninja"), &ExtractConfig::default()).unwrap();
//! println!("{} files mapped", extraction.mapping.statistics.total_files);
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the mapping types from `ninjadep_schemas` for
//! convenience.

mod build_graph;
mod classify;
mod config;
mod deps;
mod error;
mod report;
mod reverse_index;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[doc(inline)]
pub use ninjadep_schemas::{DependencyMapping, MappingStatistics};
use tracing::{info, instrument};

pub use crate::build_graph::{BuildGraph, GraphDialect, LineShape};
pub use crate::classify::{ClassifierConfig, PathClassifier};
pub use crate::config::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_QUERY_TIMEOUT, DEFAULT_WORKSPACE_ROOT, ExtractConfig,
};
pub use crate::deps::{
    DependencyResolver, ExtractionReport, NinjaDepsResolver, ObjectDependencies,
    extract_dependencies, parse_deps_output, probe_tool,
};
#[doc(inline)]
pub use crate::error::ExtractError;
pub use crate::report::{write_csv, write_json, write_summary};
pub use crate::reverse_index::build_mapping;

/// File name of the JSON mapping written next to the build graph.
pub const MAPPING_JSON_FILENAME: &str = "enhanced_dependency_mapping.json";

/// File name of the CSV mapping written next to the build graph.
pub const MAPPING_CSV_FILENAME: &str = "enhanced_file_executable_mapping.csv";

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub graph: BuildGraph,
    pub mapping: DependencyMapping,
    pub report: ExtractionReport,
}

/// Run the full pipeline against a build graph on disk.
///
/// Reads `build_file`, checks that the configured ninja can be run, then
/// queries `ninja -t deps` from the build graph's directory.
///
/// # Errors
///
/// Returns [`ExtractError`] if:
/// - The build graph cannot be read ([`ExtractError::is_build_graph_read`])
/// - The tool cannot be run at all ([`ExtractError::is_tool_unavailable`])
/// - The worker pool cannot start ([`ExtractError::is_thread_pool`])
///
/// Individual object query failures are not errors.
#[instrument(skip(config))]
pub fn run(build_file: &Path, config: &ExtractConfig) -> Result<Extraction, ExtractError> {
    let graph = BuildGraph::read(build_file, &config.dialect)?;

    let version = probe_tool(&config.tool)?;
    info!(tool = %config.tool.display(), %version, "using dependency tool");

    let resolver = NinjaDepsResolver::new(config, build_dir(build_file));
    analyze(graph, &resolver, config)
}

/// Run stages 2-4 on an already parsed graph with any resolver.
///
/// # Errors
///
/// Returns [`ExtractError`] ([`ExtractError::is_thread_pool`]) if the
/// worker pool cannot start.
pub fn analyze<R>(
    graph: BuildGraph,
    resolver: &R,
    config: &ExtractConfig,
) -> Result<Extraction, ExtractError>
where
    R: DependencyResolver + ?Sized,
{
    let objects: Vec<String> = graph.objects().map(str::to_owned).collect();
    let (dependencies, report) =
        extract_dependencies(&objects, resolver, config.max_concurrency)?;

    let classifier = PathClassifier::new(config.classifier.clone());
    let mapping = build_mapping(&graph, &dependencies, &classifier);

    Ok(Extraction {
        graph,
        mapping,
        report,
    })
}

/// Directory `ninja` must run in for a given build file.
pub fn build_dir(build_file: &Path) -> PathBuf {
    match build_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
        _ => PathBuf::from("."),
    }
}

/// Paths of the files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Writes the JSON and CSV mapping into `output_dir`.
///
/// # Errors
///
/// Returns [`ExtractError`] if either file cannot be created or written.
pub fn write_outputs(
    mapping: &DependencyMapping,
    output_dir: &Path,
) -> Result<OutputPaths, ExtractError> {
    let paths = OutputPaths {
        json: output_dir.join(MAPPING_JSON_FILENAME),
        csv: output_dir.join(MAPPING_CSV_FILENAME),
    };

    info!(path = %paths.csv.display(), "exporting CSV mapping");
    let mut csv = BufWriter::new(File::create(&paths.csv)?);
    write_csv(mapping, &mut csv)?;
    csv.flush()?;

    info!(path = %paths.json.display(), "exporting JSON mapping");
    let mut json = BufWriter::new(File::create(&paths.json)?);
    write_json(mapping, &mut json)?;
    json.flush()?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;

    const GRAPH: &str = "\
build bin/test_foo: LINK_EXECUTABLE obj/a.cpp.o obj/b.cpp.o
build bin/example_bar: LINK_EXECUTABLE obj/b.cpp.o
build obj/a.cpp.o: CXX_COMPILER ../src/a.cpp
build obj/b.cpp.o: CXX_COMPILER ../src/b.cpp
";

    fn resolver(object: &str) -> anyhow::Result<Vec<String>> {
        match object {
            "obj/a.cpp.o" => Ok(vec!["src/a.cpp".into(), "include/a.hpp".into()]),
            "obj/b.cpp.o" => Ok(vec![
                "src/b.cpp".into(),
                "include/a.hpp".into(),
                "/usr/include/c++/13/vector".into(),
            ]),
            _ => bail!("unknown object {object}"),
        }
    }

    #[test]
    fn test_analyze() {
        let config = ExtractConfig::default();
        let graph = BuildGraph::parse(GRAPH, &config.dialect);
        let extraction = analyze(graph, &resolver, &config).unwrap();

        let mapping = &extraction.mapping;
        assert_eq!(
            mapping.executables_for("include/a.hpp").unwrap().len(),
            2,
            "shared header should map to both executables"
        );
        assert_eq!(
            mapping
                .executables_for("src/a.cpp")
                .unwrap()
                .iter()
                .collect::<Vec<_>>(),
            vec!["bin/test_foo"]
        );
        assert!(mapping.executables_for("/usr/include/c++/13/vector").is_none());
        assert_eq!(extraction.report.succeeded, 2);
        assert_eq!(mapping.statistics.total_object_files, 2);
    }

    /// The same inputs always serialize to the same bytes.
    #[test]
    fn test_analyze_is_idempotent() {
        let config = ExtractConfig::default();
        let render = || {
            let graph = BuildGraph::parse(GRAPH, &config.dialect);
            let extraction = analyze(graph, &resolver, &config).unwrap();
            let mut out = Vec::new();
            write_json(&extraction.mapping, &mut out).unwrap();
            out
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn test_run_missing_build_file() {
        let err = run(Path::new("/nonexistent/build.ninja"), &ExtractConfig::default())
            .unwrap_err();
        assert!(err.is_build_graph_read());
    }

    #[test]
    fn test_run_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let build_file = dir.path().join("build.ninja");
        std::fs::write(&build_file, GRAPH).unwrap();

        let config = ExtractConfig {
            tool: PathBuf::from("/nonexistent/ninja-for-tests"),
            ..ExtractConfig::default()
        };
        let err = run(&build_file, &config).unwrap_err();
        assert!(err.is_tool_unavailable());
    }

    #[test]
    fn test_build_dir() {
        assert_eq!(build_dir(Path::new("build.ninja")), PathBuf::from("."));
        assert_eq!(
            build_dir(Path::new("build-ninja/build.ninja")),
            PathBuf::from("build-ninja")
        );
    }

    #[test]
    fn test_write_outputs() {
        let config = ExtractConfig::default();
        let extraction =
            analyze(BuildGraph::parse(GRAPH, &config.dialect), &resolver, &config).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let paths = write_outputs(&extraction.mapping, dir.path()).unwrap();

        let json = std::fs::read_to_string(&paths.json).unwrap();
        let reloaded: DependencyMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, extraction.mapping);

        let csv = std::fs::read_to_string(&paths.csv).unwrap();
        assert!(csv.starts_with("source_file,executables\n"));
        assert!(csv.contains("\"include/a.hpp\",\"bin/example_bar;bin/test_foo\""));
    }
}
