use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use itertools::Itertools;
use mimalloc::MiMalloc;
use ninjadep_extract::{
    ClassifierConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_WORKSPACE_ROOT, ExtractConfig,
};
use ninjadep_schemas::FilterMode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Map changed C++/GPU sources to the ninja executables that depend on
/// them, so CI can rebuild and re-run only what a change touches.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the file-to-executable mapping from a ninja build graph
    ///
    /// Parses build.ninja, asks `ninja -t deps` for every object's full
    /// dependency list, and writes the JSON and CSV mappings.
    Parse {
        /// Path to build.ninja
        build_file: PathBuf,

        /// The ninja executable to query
        #[arg(long, default_value = "ninja")]
        ninja: PathBuf,

        /// Prefix stripped from dependency paths
        #[arg(long, default_value = DEFAULT_WORKSPACE_ROOT)]
        workspace_root: String,

        /// Maximum number of concurrent dependency queries
        #[arg(short, long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
        jobs: usize,

        /// JSON file overriding the project-file classifier
        #[arg(long)]
        classifier_config: Option<PathBuf>,

        /// Directory for the mapping files (defaults to the build directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Select the tests affected by the changes between two git revisions
    Select {
        /// Dependency mapping JSON produced by `parse`
        mapping: PathBuf,

        /// Base revision
        from: String,

        /// Target revision
        to: String,

        /// Keep every affected executable (the default; wins over --test-prefix)
        #[arg(long)]
        all: bool,

        /// Keep only executables whose id, or last path component, starts
        /// with test_ (so bin/test_foo is kept)
        #[arg(long)]
        test_prefix: bool,

        /// Where to write the selection
        #[arg(short, long, default_value = ninjadep_select::SELECTION_FILENAME)]
        output: PathBuf,
    },

    /// Print every mapped file with the executables that depend on it
    Audit {
        /// Dependency mapping JSON produced by `parse`
        mapping: PathBuf,
    },

    /// Print the executables that must be rebuilt for a set of changed files
    Optimize {
        /// Dependency mapping JSON produced by `parse`
        mapping: PathBuf,

        /// Changed files, relative to the workspace root
        #[arg(required = true)]
        changed_files: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only command output.
    const CRATES: &[&str] = &[
        "ninjadep",
        "ninjadep_extract",
        "ninjadep_schemas",
        "ninjadep_select",
    ];
    let level = cli.verbose.tracing_level_filter();
    let allowlist = CRATES.iter().map(|c| format!("{c}={level}")).join(",");
    let filter = EnvFilter::new(format!("warn,{allowlist}"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Parse {
            build_file,
            ninja,
            workspace_root,
            jobs,
            classifier_config,
            output_dir,
        } => {
            if !build_file.is_file() {
                bail!("build file not found: {}", build_file.display());
            }
            let classifier = match classifier_config {
                Some(path) => ClassifierConfig::from_json_file(&path).with_context(|| {
                    format!("failed to load classifier config {}", path.display())
                })?,
                None => ClassifierConfig::default(),
            };
            let config = ExtractConfig {
                tool: ninja,
                workspace_root,
                max_concurrency: jobs,
                classifier,
                ..ExtractConfig::default()
            };

            let extraction = ninjadep_extract::run(&build_file, &config)
                .with_context(|| format!("failed to map {}", build_file.display()))?;

            let output_dir =
                output_dir.unwrap_or_else(|| ninjadep_extract::build_dir(&build_file));
            let paths = ninjadep_extract::write_outputs(&extraction.mapping, &output_dir)
                .with_context(|| format!("failed to write mapping to {}", output_dir.display()))?;

            ninjadep_extract::write_summary(&extraction.mapping, &extraction.report, &mut out)?;
            writeln!(out)?;
            writeln!(out, "Results exported to:")?;
            writeln!(out, "  JSON: {}", paths.json.display())?;
            writeln!(out, "  CSV: {}", paths.csv.display())?;
        }

        Commands::Select {
            mapping,
            from,
            to,
            all,
            test_prefix,
            output,
        } => {
            let filter = if test_prefix && !all {
                FilterMode::test_prefix()
            } else {
                FilterMode::All
            };
            let mapping = load(&mapping)?;

            let changed = ninjadep_select::changed_files(Path::new("."), &from, &to)?;
            if changed.is_empty() {
                info!("no changed files detected");
            }
            let selection = ninjadep_select::select(&mapping, &changed, &filter);

            let mut file = BufWriter::new(
                File::create(&output)
                    .with_context(|| format!("failed to create {}", output.display()))?,
            );
            ninjadep_select::write_selection(&selection, &mut file)?;
            file.flush()?;

            writeln!(
                out,
                "Exported {} tests to run to {}",
                selection.tests_to_run.len(),
                output.display()
            )?;
        }

        Commands::Audit { mapping } => {
            let mapping = load(&mapping)?;
            ninjadep_select::write_audit(&mapping, &mut out)?;
        }

        Commands::Optimize {
            mapping,
            changed_files,
        } => {
            let mapping = load(&mapping)?;
            let changed: BTreeSet<String> = changed_files.into_iter().collect();
            let affected = ninjadep_select::query(&mapping, &changed, &FilterMode::All);
            ninjadep_select::write_affected(&affected, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn load(path: &Path) -> Result<ninjadep_schemas::DependencyMapping> {
    ninjadep_select::load_mapping(path)
        .with_context(|| format!("dependency map JSON not usable: {}", path.display()))
}
