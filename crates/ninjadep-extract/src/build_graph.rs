//! Forward build graph parsing.
//!
//! Reads a generated `build.ninja` and recovers the two forward relations
//! the reverse index is built from:
//!
//! - executable -> ordered list of object files it links
//! - object file -> primary source file it is compiled from
//!
//! The file is processed one line at a time. Each line is classified by
//! [`GraphDialect::classify`] into a [`LineShape`]; anything that is not a
//! qualifying executable rule or object compile rule is ignored. Later
//! rules for the same output replace earlier ones.
//!
//! Example input:
//!
//! ```text
//! build bin/test_foo: CXX_EXECUTABLE_LINKER obj/a.cpp.o obj/b.cpp.o | lib/libutil.a
//! build obj/a.cpp.o: CXX_COMPILER__util src/a.cpp || cmake_object_order_depends
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug_span, info};

use crate::error::ExtractError;

/// Naming conventions used to recognise executable and object rules.
///
/// Heuristic by nature: an executable is recognised by its output
/// directory plus either the rule tag or a test/example naming marker, so
/// unusual target names can be over- or under-matched. Adjust the dialect
/// rather than the parser when a project deviates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDialect {
    /// Output prefix of linked executables.
    pub executable_prefix: String,
    /// Substring anywhere in the line marking an executable link rule.
    pub executable_rule_marker: String,
    /// Substrings of the output path marking a test/example executable.
    pub executable_name_markers: Vec<String>,
    /// Suffix of object files in an executable's input list.
    pub object_suffix: String,
    /// Suffixes of compiled-object outputs with a recorded primary source.
    pub object_source_suffixes: Vec<String>,
}

impl Default for GraphDialect {
    fn default() -> Self {
        Self {
            executable_prefix: "bin/".to_owned(),
            executable_rule_marker: "EXECUTABLE".to_owned(),
            executable_name_markers: vec!["test_".to_owned(), "example_".to_owned()],
            object_suffix: ".o".to_owned(),
            object_source_suffixes: vec![
                ".cpp.o".to_owned(),
                ".cu.o".to_owned(),
                ".hip.o".to_owned(),
            ],
        }
    }
}

/// What a single build-graph line declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineShape<'a> {
    /// A qualifying executable link rule and its relative object inputs.
    Executable {
        output: &'a str,
        objects: Vec<&'a str>,
    },
    /// An object compile rule and its primary source.
    Object { output: &'a str, source: &'a str },
    /// Anything else.
    Other,
}

/// `build <output>: <rule><rest>`, where `rest` starts with whitespace.
struct BuildStatement<'a> {
    output: &'a str,
    rest: &'a str,
}

/// Splits a `build` line into its output and everything after the rule
/// name. Requires whitespace after the colon and after the rule name.
fn split_build_statement(line: &str) -> Option<BuildStatement<'_>> {
    let body = line.strip_prefix("build ")?;
    let (output, after_colon) = body.split_once(':')?;
    if output.is_empty() || !after_colon.starts_with(char::is_whitespace) {
        return None;
    }

    let after_colon = after_colon.trim_start();
    let rule_end = after_colon.find(char::is_whitespace)?;
    Some(BuildStatement {
        output,
        rest: &after_colon[rule_end..],
    })
}

impl GraphDialect {
    /// Classifies one line of the build graph.
    ///
    /// The executable shape is checked first. A line with the executable
    /// shape that does not qualify (a library, an intermediate link step)
    /// falls through to the object check.
    pub fn classify<'a>(&self, line: &'a str) -> LineShape<'a> {
        let Some(statement) = split_build_statement(line) else {
            return LineShape::Other;
        };

        if let Some(objects) = self.executable_objects(line, &statement) {
            return LineShape::Executable {
                output: statement.output,
                objects,
            };
        }

        if let Some(source) = self.object_source(&statement) {
            return LineShape::Object {
                output: statement.output,
                source,
            };
        }

        LineShape::Other
    }

    fn executable_objects<'a>(
        &self,
        line: &str,
        statement: &BuildStatement<'a>,
    ) -> Option<Vec<&'a str>> {
        let output = statement.output;
        if output.len() <= self.executable_prefix.len()
            || !output.starts_with(self.executable_prefix.as_str())
        {
            return None;
        }

        let qualifies = line.contains(self.executable_rule_marker.as_str())
            || self
                .executable_name_markers
                .iter()
                .any(|marker| output.contains(marker.as_str()));
        if !qualifies {
            return None;
        }

        // Explicit inputs run up to the order-only separator and must
        // contain something past the whitespace ending the rule name.
        let mut chars = statement.rest.chars();
        chars.next();
        let explicit = chars.as_str().split('|').next().unwrap_or_default();
        if explicit.is_empty() {
            return None;
        }

        let objects = explicit
            .split_whitespace()
            .filter(|dep| dep.ends_with(self.object_suffix.as_str()) && !dep.starts_with('/'))
            .collect();
        Some(objects)
    }

    fn object_source<'a>(&self, statement: &BuildStatement<'a>) -> Option<&'a str> {
        let output = statement.output;
        let is_object = self
            .object_source_suffixes
            .iter()
            .any(|suffix| output.len() > suffix.len() && output.ends_with(suffix.as_str()));
        if !is_object {
            return None;
        }

        let source = statement
            .rest
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '|')
            .next()
            .unwrap_or_default();
        (!source.is_empty()).then_some(source)
    }
}

/// The forward relations recovered from a build graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildGraph {
    /// Executable output path -> object files it links, in rule order.
    pub executables: BTreeMap<String, Vec<String>>,
    /// Object file -> primary source file.
    pub object_sources: BTreeMap<String, String>,
}

impl BuildGraph {
    /// Parses build-graph text.
    pub fn parse(text: &str, dialect: &GraphDialect) -> Self {
        let _span = debug_span!("parse_build_graph").entered();
        let mut graph = BuildGraph::default();

        for line in text.lines() {
            match dialect.classify(line) {
                LineShape::Executable { output, objects } => {
                    graph.executables.insert(
                        output.to_owned(),
                        objects.into_iter().map(str::to_owned).collect(),
                    );
                }
                LineShape::Object { output, source } => {
                    graph
                        .object_sources
                        .insert(output.to_owned(), source.to_owned());
                }
                LineShape::Other => {}
            }
        }

        info!(
            executables = graph.executables.len(),
            objects = graph.object_sources.len(),
            "parsed build graph"
        );
        graph
    }

    /// Reads and parses a build-graph file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] ([`ExtractError::is_build_graph_read`]) if
    /// the file cannot be read.
    pub fn read(path: &Path, dialect: &GraphDialect) -> Result<Self, ExtractError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExtractError::build_graph_read(path, e))?;
        Ok(Self::parse(&text, dialect))
    }

    /// Object files with a compile rule, in sorted order.
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.object_sources.keys().map(String::as_str)
    }

    /// Primary source of `object`, if the graph records one.
    pub fn primary_source(&self, object: &str) -> Option<&str> {
        self.object_sources.get(object).map(String::as_str)
    }
}
