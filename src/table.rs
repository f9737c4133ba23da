use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use log::debug;

use crate::error::{PipelineError, Result};

/// An in-memory CSV table: one header row plus string cells.
///
/// Every stage after extraction reads and writes its datasets through this type.
/// Cells are kept as text so that columns a stage does not touch are written
/// back exactly as they were read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Table { headers, rows }
    }

    /// Reads a headed CSV file. Short rows are padded with empty cells.
    pub fn read_csv(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
        debug!("Reading table: {:?}", path);
        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }
        debug!("Read {} rows from {:?}", rows.len(), path);

        Ok(Table { headers, rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        debug!("Writing {} rows to {:?}", self.rows.len(), path);
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Returns the cell of `row` under `column`, treating empty cells as absent.
    pub fn cell<'a>(&'a self, row: &'a [String], column: &str) -> Option<&'a str> {
        self.column_index(column)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .filter(|value| !is_missing(value))
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(column).map(String::as_str).unwrap_or(""))
    }
}

/// Whether a cell counts as a missing value (empty, or a NaN written by another tool).
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// Formats a float the way every stage writes numbers to CSV.
///
/// Integral values keep a trailing `.0` so numeric columns stay recognisably
/// floating point; everything else uses the shortest round-trip representation.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Files directly under `dir` whose name ends with `suffix`, in name order.
pub fn files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(suffix))
            .unwrap_or(false);
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Replaces the trailing `from` of `name` with `to`.
pub fn swap_suffix(name: &str, from: &str, to: &str) -> String {
    match name.strip_suffix(from) {
        Some(stem) => format!("{}{}", stem, to),
        None => format!("{}{}", name, to),
    }
}
