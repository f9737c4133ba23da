use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    error::{PipelineError, Result, RunReport},
    table::{files_with_suffix, Table},
};

/// Concatenates tables into one.
///
/// The header is the union of all headers in first-seen order; cells of a
/// column a table does not carry are left empty.
pub fn merge_tables(tables: &[Table]) -> Table {
    let mut headers: Vec<String> = Vec::new();
    for table in tables {
        for header in &table.headers {
            if !headers.contains(header) {
                headers.push(header.clone());
            }
        }
    }

    let mut merged = Table::new(headers);
    for table in tables {
        let positions: Vec<Option<usize>> = merged
            .headers
            .iter()
            .map(|header| table.column_index(header))
            .collect();
        for row in &table.rows {
            let cells = positions
                .iter()
                .map(|position| {
                    position
                        .and_then(|idx| row.get(idx))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();
            merged.rows.push(cells);
        }
    }
    merged
}

/// Reads and merges the given files, skipping unreadable ones.
pub fn merge_files(paths: &[PathBuf]) -> (Table, RunReport) {
    let mut report = RunReport::new("files");
    let mut tables = Vec::with_capacity(paths.len());

    for path in paths {
        match Table::read_csv(path) {
            Ok(table) => {
                info!("Merging: {:?} ({} rows)", path, table.len());
                tables.push(table);
                report.record_processed();
            }
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                report.record_error(&e);
            }
        }
    }
    (merge_tables(&tables), report)
}

/// Merges every file of `input_dir` ending with `suffix` into `output`.
///
/// Files are taken in name order and `output` itself is never read back in,
/// however its path is spelled. Nothing is written when no file matches.
pub fn run_merge(input_dir: &Path, output: &Path, suffix: &str) -> Result<RunReport> {
    if !input_dir.is_dir() {
        return Err(PipelineError::MissingInput(input_dir.to_path_buf()));
    }

    // An output that does not exist yet cannot be one of the inputs.
    let resolved_output = fs::canonicalize(output).ok();
    let paths: Vec<PathBuf> = files_with_suffix(input_dir, suffix)?
        .into_iter()
        .filter(|path| match &resolved_output {
            Some(resolved) => fs::canonicalize(path).ok().as_ref() != Some(resolved),
            None => true,
        })
        .collect();
    if paths.is_empty() {
        info!("No files ending with '{}' found to merge", suffix);
        return Ok(RunReport::new("files"));
    }

    let (merged, report) = merge_files(&paths);
    if report.processed == 0 {
        warn!("None of the {} matching files could be read", paths.len());
        return Ok(report);
    }

    merged.write_csv(output)?;
    info!(
        "Merged {} files with a total of {} rows into {:?}",
        report.processed,
        merged.len(),
        output
    );
    report.log_summary("merge");
    Ok(report)
}
