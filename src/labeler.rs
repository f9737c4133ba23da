use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};

use crate::{
    config::LabelConfig,
    error::{PipelineError, Result, RunReport},
    table::Table,
};

/// Counts of each distinct value of a column, in value order.
pub fn value_counts(table: &Table, column: usize) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in table.column_values(column) {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

fn log_counts(title: &str, counts: &BTreeMap<String, usize>) {
    info!("{}:", title);
    for (value, count) in counts {
        info!("  {:<20} {}", value, count);
    }
}

/// Replaces the textual connection state with its code and appends the
/// integer class of each row's label.
///
/// Rows whose label has no class, or whose state has no code, are dropped and
/// counted. The textual label column is removed when configured so.
pub fn label_table(table: &Table, config: &LabelConfig) -> Result<(Table, RunReport)> {
    let state_idx = table.require_column(&config.state_column)?;
    let label_idx = table.require_column(&config.label_column)?;

    log_counts("Label counts", &value_counts(table, label_idx));

    let kept: Vec<usize> = (0..table.headers.len())
        .filter(|&idx| !(config.drop_label_column && idx == label_idx))
        .collect();
    let mut headers: Vec<String> = kept.iter().map(|&idx| table.headers[idx].clone()).collect();
    headers.push(config.class_column.clone());

    let mut report = RunReport::new("rows");
    let mut output = Table::new(headers);

    for (index, row) in table.rows.iter().enumerate() {
        let label = row[label_idx].trim();
        let Some(class) = config.class_map.get(label) else {
            debug!("Row {}: label '{}' has no class", index, label);
            report.record_error(&PipelineError::UnmappedLabel(label.to_string()));
            continue;
        };
        let state = row[state_idx].trim();
        let Some(state_code) = config.state_map.get(state) else {
            debug!("Row {}: connection state '{}' has no code", index, state);
            report.record_error(&PipelineError::malformed(
                &config.state_column,
                format!("unknown state '{}'", state),
            ));
            continue;
        };

        let mut cells: Vec<String> = kept
            .iter()
            .map(|&idx| {
                if idx == state_idx {
                    state_code.to_string()
                } else {
                    row[idx].clone()
                }
            })
            .collect();
        cells.push(class.to_string());
        output.rows.push(cells);
        report.record_processed();
    }

    if let Some(class_idx) = output.column_index(&config.class_column) {
        log_counts("Class counts", &value_counts(&output, class_idx));
    }
    Ok((output, report))
}

pub fn run_label(input: &Path, output: &Path, config: &LabelConfig) -> Result<RunReport> {
    info!("Processing file: {:?}", input);
    let table = Table::read_csv(input)?;
    let (labeled, report) = label_table(&table, config)?;
    labeled.write_csv(output)?;
    info!("Labeled file saved to {:?}", output);
    report.log_summary("label");
    Ok(report)
}
