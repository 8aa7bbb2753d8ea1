//! Per-object dependency extraction.
//!
//! Every object's full dependency list (primary source plus every header it
//! pulled in) comes from `ninja -t deps <object>`, run once per object. The
//! queries are independent, so they run on a bounded rayon pool. Each
//! worker hands back its own `(object, result)` pair and the pairs are
//! merged on the calling thread once the pool drains; workers share
//! nothing but a progress counter.
//!
//! A query that fails (spawn error, non-zero exit, timeout) is logged and
//! leaves that object with an empty dependency list. It never aborts the
//! batch.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};
use wait_timeout::ChildExt;

use crate::config::ExtractConfig;
use crate::error::ExtractError;

/// How often (in completed queries) progress is logged.
const PROGRESS_INTERVAL: usize = 100;

/// Source of an object file's dependency list.
///
/// Implementations must be callable from several threads at once.
pub trait DependencyResolver: Sync {
    /// Returns every dependency path recorded for `object`.
    ///
    /// # Errors
    ///
    /// Any failure. The caller logs it and treats the object as having no
    /// dependencies.
    fn resolve(&self, object: &str) -> anyhow::Result<Vec<String>>;
}

impl<F> DependencyResolver for F
where
    F: Fn(&str) -> anyhow::Result<Vec<String>> + Sync,
{
    fn resolve(&self, object: &str) -> anyhow::Result<Vec<String>> {
        self(object)
    }
}

/// Resolves dependencies by running `<tool> -t deps <object>` in the build
/// directory.
#[derive(Debug, Clone)]
pub struct NinjaDepsResolver {
    tool: PathBuf,
    build_dir: PathBuf,
    workspace_prefix: String,
    timeout: Duration,
}

impl NinjaDepsResolver {
    pub fn new(config: &ExtractConfig, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool: config.tool.clone(),
            build_dir: build_dir.into(),
            workspace_prefix: config.workspace_prefix(),
            timeout: config.query_timeout,
        }
    }
}

impl DependencyResolver for NinjaDepsResolver {
    fn resolve(&self, object: &str) -> anyhow::Result<Vec<String>> {
        let mut child = Command::new(&self.tool)
            .args(["-t", "deps"])
            .arg(object)
            .current_dir(&self.build_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to run {}", self.tool.display()))?;

        // Drain stdout on its own thread so a large dependency list cannot
        // fill the pipe and stall the child while we wait on it.
        let mut stdout = child
            .stdout
            .take()
            .context("dependency query stdout was not captured")?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        // On timeout the reader is detached, not joined: a grandchild forked
        // by a wrapper script can keep the pipe open after the kill.
        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                drop(reader);
                bail!("timed out after {:?}", self.timeout);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                drop(reader);
                return Err(e).context("failed to wait for dependency query");
            }
        };

        let output = reader
            .join()
            .map_err(|_| anyhow!("dependency query reader thread panicked"))?
            .context("failed to read dependency query output")?;

        if !status.success() {
            bail!("{} -t deps exited with {status}", self.tool.display());
        }

        Ok(parse_deps_output(
            &String::from_utf8_lossy(&output),
            &self.workspace_prefix,
        ))
    }
}

/// Parses `ninja -t deps` output for one object.
///
/// The first line is the tool's header (`obj/a.cpp.o: #deps 3, deps mtime
/// ...`) and is dropped. Blank lines and `#` comments are skipped. Each
/// remaining line is one path; `workspace_prefix` is stripped when present
/// and the path is otherwise kept verbatim.
pub fn parse_deps_output(output: &str, workspace_prefix: &str) -> Vec<String> {
    output
        .trim()
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.strip_prefix(workspace_prefix).unwrap_or(line).to_owned())
        .collect()
}

/// Outcome counts of one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Objects queried.
    pub queried: usize,
    /// Queries that returned a dependency list.
    pub succeeded: usize,
    /// Queries that failed and were recorded with no dependencies.
    pub failed: usize,
}

/// Object file -> dependency paths, one entry per queried object.
pub type ObjectDependencies = BTreeMap<String, Vec<String>>;

/// Queries `resolver` for every object using at most `max_concurrency`
/// concurrent queries.
///
/// Every object gets an entry in the result; failed queries map to an
/// empty list. An empty `objects` slice returns immediately.
///
/// # Errors
///
/// Returns [`ExtractError`] ([`ExtractError::is_thread_pool`]) only if the
/// worker pool cannot be started.
#[instrument(skip_all, fields(objects = objects.len()))]
pub fn extract_dependencies<R>(
    objects: &[String],
    resolver: &R,
    max_concurrency: usize,
) -> Result<(ObjectDependencies, ExtractionReport), ExtractError>
where
    R: DependencyResolver + ?Sized,
{
    if objects.is_empty() {
        info!("no object files, skipping dependency extraction");
        return Ok((ObjectDependencies::new(), ExtractionReport::default()));
    }

    let total = objects.len();
    let workers = max_concurrency.clamp(1, total);
    info!(workers, "extracting dependencies for {total} object files");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("ninjadep-deps-{i}"))
        .build()?;

    let completed = AtomicUsize::new(0);
    let results: Vec<(&str, anyhow::Result<Vec<String>>)> = pool.install(|| {
        objects
            .par_iter()
            .map(|object| {
                let result = resolver.resolve(object);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_INTERVAL == 0 {
                    info!("processed {done}/{total} object files");
                }
                (object.as_str(), result)
            })
            .collect()
    });

    let mut report = ExtractionReport {
        queried: total,
        ..ExtractionReport::default()
    };
    let mut dependencies = ObjectDependencies::new();
    for (object, result) in results {
        let deps = match result {
            Ok(deps) => {
                debug!(object, count = deps.len(), "resolved dependencies");
                report.succeeded += 1;
                deps
            }
            Err(e) => {
                warn!(object, error = %format!("{e:#}"), "dependency query failed");
                report.failed += 1;
                Vec::new()
            }
        };
        dependencies.insert(object.to_owned(), deps);
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "completed dependency extraction"
    );
    Ok((dependencies, report))
}

/// Checks that the dependency tool can be run at all, returning its
/// version string.
///
/// # Errors
///
/// Returns [`ExtractError`] ([`ExtractError::is_tool_unavailable`]) if
/// `<tool> --version` cannot be spawned or exits unsuccessfully.
pub fn probe_tool(tool: &Path) -> Result<String, ExtractError> {
    let output = Command::new(tool)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ExtractError::tool_unavailable(tool, e.to_string()))?;

    if !output.status.success() {
        return Err(ExtractError::tool_unavailable(
            tool,
            format!("`--version` exited with {}", output.status),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}
