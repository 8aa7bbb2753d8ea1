//! Exports and the human-readable summary of a mapping.

use std::io::Write;

use itertools::Itertools;
use ninjadep_schemas::DependencyMapping;

use crate::deps::ExtractionReport;

/// Number of most-shared files listed in the summary.
const TOP_SHARED_FILES: usize = 10;

/// Writes the mapping as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Returns any serialization or write error.
pub fn write_json(
    mapping: &DependencyMapping,
    mut output: impl Write,
) -> Result<(), crate::ExtractError> {
    serde_json::to_writer_pretty(&mut output, mapping)?;
    writeln!(output)?;
    Ok(())
}

/// Writes `source_file,executables` CSV, one row per file.
///
/// Rows are sorted by file; each row's executables are sorted and joined
/// with `;` inside a single quoted field.
///
/// # Errors
///
/// Returns any write error.
pub fn write_csv(mapping: &DependencyMapping, mut output: impl Write) -> std::io::Result<()> {
    writeln!(output, "source_file,executables")?;
    for (file, executables) in &mapping.file_to_executables {
        writeln!(
            output,
            "{},{}",
            quote(file),
            quote(&executables.iter().join(";"))
        )?;
    }
    Ok(())
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Writes the end-of-run summary.
///
/// # Errors
///
/// Returns any write error.
pub fn write_summary(
    mapping: &DependencyMapping,
    report: &ExtractionReport,
    mut output: impl Write,
) -> std::io::Result<()> {
    let stats = &mapping.statistics;
    let files = mapping.file_to_executables.keys();
    let count_ext = |ext: &str| files.clone().filter(|f| f.ends_with(ext)).count();

    writeln!(output, "=== Dependency Mapping Summary ===")?;
    writeln!(output, "Total executables: {}", stats.total_executables)?;
    writeln!(output, "Total files mapped: {}", stats.total_files)?;
    writeln!(output, "Total object files processed: {}", report.queried)?;
    if report.failed > 0 {
        writeln!(output, "Object files without dependencies (query failed): {}", report.failed)?;
    }

    writeln!(output)?;
    writeln!(output, "File types:")?;
    writeln!(output, "  .cpp files: {}", count_ext(".cpp"))?;
    writeln!(output, "  .hpp files: {}", count_ext(".hpp"))?;
    writeln!(output, "  .h files: {}", count_ext(".h"))?;

    writeln!(output)?;
    writeln!(
        output,
        "Files used by multiple executables: {}",
        stats.files_with_multiple_executables
    )?;

    let top = mapping
        .file_to_executables
        .iter()
        .filter(|(_, exes)| exes.len() > 1)
        .sorted_by(|(a_file, a_exes), (b_file, b_exes)| {
            b_exes.len().cmp(&a_exes.len()).then_with(|| a_file.cmp(b_file))
        })
        .take(TOP_SHARED_FILES)
        .collect::<Vec<_>>();
    if !top.is_empty() {
        writeln!(output)?;
        writeln!(output, "Top files with most dependents:")?;
        for (file, exes) in top {
            writeln!(output, "  {file}: {} executables", exes.len())?;
        }
    }

    Ok(())
}
