//! Run configuration for the extraction pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::build_graph::GraphDialect;
use crate::classify::ClassifierConfig;

/// Default upper bound on concurrent dependency queries.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Default per-object dependency query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default workspace root, relative to the build directory.
pub const DEFAULT_WORKSPACE_ROOT: &str = "..";

/// Everything a pipeline run needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// The ninja executable used for `-t deps` queries.
    pub tool: PathBuf,
    /// Prefix stripped from dependency paths so absolute and
    /// workspace-relative spellings collapse to the same key.
    pub workspace_root: String,
    /// Upper bound on concurrent dependency queries.
    pub max_concurrency: usize,
    /// Per-object query timeout.
    pub query_timeout: Duration,
    pub classifier: ClassifierConfig,
    pub dialect: GraphDialect,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            tool: PathBuf::from("ninja"),
            workspace_root: DEFAULT_WORKSPACE_ROOT.to_owned(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            classifier: ClassifierConfig::default(),
            dialect: GraphDialect::default(),
        }
    }
}

impl ExtractConfig {
    /// The prefix stripped from dependency paths: the workspace root with
    /// exactly one trailing `/`.
    pub fn workspace_prefix(&self) -> String {
        format!("{}/", self.workspace_root.trim_end_matches('/'))
    }
}
