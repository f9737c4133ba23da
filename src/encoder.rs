use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    config::EncodeConfig,
    error::{PipelineError, Result, RunReport},
    table::{files_with_suffix, format_float, is_missing, swap_suffix, Table},
};

/// Per-column min/max learnt from a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min_vals: Vec<f64>,
    pub max_vals: Vec<f64>,
}

impl MinMaxScaler {
    /// Learns the range of every column of `columns` (rows of values).
    pub fn fit(columns: &[Vec<f64>]) -> Self {
        let mut scaler = MinMaxScaler::default();
        for column in columns {
            scaler
                .min_vals
                .push(column.iter().copied().fold(f64::INFINITY, f64::min));
            scaler
                .max_vals
                .push(column.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        }
        scaler
    }

    /// Rescales `value` of column `index` to `[0, 1]`; a constant column maps to 0.
    pub fn transform(&self, index: usize, value: f64) -> f64 {
        let min_val = self.min_vals.get(index).copied().unwrap_or(0.0);
        let max_val = self.max_vals.get(index).copied().unwrap_or(1.0);
        let range = max_val - min_val;
        if range == 0.0 || !range.is_finite() {
            0.0
        } else {
            (value - min_val) / range
        }
    }
}

/// Observed categories per column, in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub columns: Vec<String>,
    pub categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Learns the categories of each named column from its values.
    ///
    /// Categories sort numerically when every value of a column is a number,
    /// lexicographically otherwise.
    pub fn fit(columns: &[String], values: &[Vec<&str>]) -> Self {
        let categories = values
            .iter()
            .map(|column| {
                let mut seen: Vec<String> = column.iter().map(|v| v.to_string()).collect();
                seen.sort_by(|a, b| compare_categories(a, b));
                seen.dedup();
                seen
            })
            .collect();
        OneHotEncoder {
            columns: columns.to_vec(),
            categories,
        }
    }

    /// Indicator column names: `{column}_{category}`.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, categories)| {
                categories
                    .iter()
                    .map(move |category| format!("{}_{}", column, category))
            })
            .collect()
    }

    /// Indicators of one row. An unseen category leaves all of its column's
    /// indicators at zero.
    pub fn transform(&self, row_values: &[&str]) -> Vec<f64> {
        let mut encoded = Vec::with_capacity(self.categories.iter().map(Vec::len).sum());
        for (value, categories) in row_values.iter().zip(&self.categories) {
            encoded.extend(
                categories
                    .iter()
                    .map(|category| if category == value { 1.0 } else { 0.0 }),
            );
        }
        encoded
    }
}

fn compare_categories(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Drops incomplete rows, min-max scales the numeric columns and one-hot
/// expands the categorical ones.
///
/// Only configured columns the table actually carries are touched. The output
/// holds the non-categorical columns in their original order followed by the
/// indicator columns.
pub fn encode_table(table: &Table, config: &EncodeConfig) -> Result<(Table, RunReport)> {
    let numeric: Vec<usize> = present_columns(table, &config.numeric_columns);
    let categorical: Vec<usize> = present_columns(table, &config.categorical_columns);
    debug!(
        "Encoding {} numeric and {} categorical columns",
        numeric.len(),
        categorical.len()
    );

    let mut report = RunReport::new("rows");
    let rows: Vec<&Vec<String>> = table
        .rows
        .iter()
        .filter(|row| {
            let complete = !row.iter().any(|cell| is_missing(cell));
            if !complete {
                report.record_error(&PipelineError::malformed("row", "missing value"));
            }
            complete
        })
        .collect();

    let numeric_values = numeric
        .iter()
        .map(|&idx| {
            rows.iter()
                .map(|row| {
                    row[idx].trim().parse::<f64>().map_err(|_| {
                        PipelineError::malformed(
                            &table.headers[idx],
                            format!("'{}' is not a number", row[idx]),
                        )
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;
    let scaler = MinMaxScaler::fit(&numeric_values);

    let categorical_names: Vec<String> = categorical
        .iter()
        .map(|&idx| table.headers[idx].clone())
        .collect();
    let categorical_values: Vec<Vec<&str>> = categorical
        .iter()
        .map(|&idx| rows.iter().map(|row| row[idx].as_str()).collect())
        .collect();
    let encoder = OneHotEncoder::fit(&categorical_names, &categorical_values);

    let kept: Vec<usize> = (0..table.headers.len())
        .filter(|idx| !categorical.contains(idx))
        .collect();
    let mut headers: Vec<String> = kept.iter().map(|&idx| table.headers[idx].clone()).collect();
    headers.extend(encoder.feature_names());
    let mut output = Table::new(headers);

    for (row_index, row) in rows.iter().enumerate() {
        let mut cells: Vec<String> = kept
            .iter()
            .map(|&idx| match numeric.iter().position(|&n| n == idx) {
                Some(column) => format_float(
                    scaler.transform(column, numeric_values[column][row_index]),
                ),
                None => row[idx].clone(),
            })
            .collect();
        let row_values: Vec<&str> = categorical.iter().map(|&idx| row[idx].as_str()).collect();
        cells.extend(encoder.transform(&row_values).into_iter().map(format_float));
        output.rows.push(cells);
        report.record_processed();
    }

    Ok((output, report))
}

fn present_columns(table: &Table, names: &[String]) -> Vec<usize> {
    names
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect()
}

/// Encodes every `_combined.csv` of `input_dir` into a `_processed.csv` of
/// `output_dir`.
pub fn run_encode(input_dir: &Path, output_dir: &Path, config: &EncodeConfig) -> Result<RunReport> {
    if !input_dir.is_dir() {
        return Err(PipelineError::MissingInput(input_dir.to_path_buf()));
    }
    fs::create_dir_all(output_dir)?;

    let mut report = RunReport::new("files");
    for input_path in files_with_suffix(input_dir, &config.input_suffix)? {
        let file_name = input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_name = swap_suffix(&file_name, &config.input_suffix, &config.output_suffix);
        let output_path = output_dir.join(&output_name);

        if output_path.exists() {
            info!("Already exists: {}, skipped", output_name);
            report.already_done += 1;
            continue;
        }

        info!("Processing: {}", file_name);
        let result = Table::read_csv(&input_path)
            .and_then(|table| encode_table(&table, config))
            .and_then(|(encoded, rows)| {
                rows.log_summary(&file_name);
                encoded.write_csv(&output_path)
            });
        match result {
            Ok(()) => {
                info!("Saved: {:?}", output_path);
                report.record_processed();
            }
            Err(e) => {
                warn!("Error processing {}: {}", file_name, e);
                report.record_error(&e);
            }
        }
    }

    report.log_summary("encode");
    Ok(report)
}
