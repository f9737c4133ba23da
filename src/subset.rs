use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use rand::{rngs::StdRng, seq::index::sample, SeedableRng};

use crate::{
    config::SubsetConfig,
    error::{PipelineError, Result, RunReport},
    labeler::value_counts,
    table::Table,
};

/// How rows are drawn from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum SubsetMode {
    /// A uniform sample of this share of all rows.
    Fraction(f64),
    /// Up to `cap` rows of every class, optionally restricted to `labels`.
    PerClass {
        cap: usize,
        labels: Option<Vec<String>>,
    },
}

/// Draws `amount` distinct row indices out of `length`, in draw order.
fn draw(length: usize, amount: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    sample(&mut rng, length, amount.min(length)).into_vec()
}

/// Uniform sample without replacement of `round(fraction * len)` rows.
pub fn sample_fraction(table: &Table, fraction: f64, seed: u64) -> Result<Table> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(PipelineError::InvalidConfig(format!(
            "fraction {} is outside [0, 1]",
            fraction
        )));
    }
    let amount = (fraction * table.len() as f64).round() as usize;
    let rows = draw(table.len(), amount, seed)
        .into_iter()
        .map(|idx| table.rows[idx].clone())
        .collect();
    Ok(Table::from_rows(table.headers.clone(), rows))
}

/// Per-class sample of `min(cap, available)` rows, classes in sorted order.
///
/// Every class is sampled with a generator seeded afresh, so adding or
/// removing one class does not change the rows drawn for another.
pub fn sample_per_class(
    table: &Table,
    label_column: &str,
    cap: usize,
    labels: Option<&[String]>,
    seed: u64,
) -> Result<Table> {
    let label_idx = table.require_column(label_column)?;

    let mut classes: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let label = row[label_idx].as_str();
        if labels.map_or(true, |wanted| wanted.iter().any(|l| l == label)) {
            classes.entry(label).or_default().push(idx);
        }
    }

    let mut output = Table::new(table.headers.clone());
    for (label, members) in classes {
        let picked = draw(members.len(), cap, seed);
        info!("Class {}: {} of {} rows", label, picked.len(), members.len());
        output
            .rows
            .extend(picked.into_iter().map(|i| table.rows[members[i]].clone()));
    }
    Ok(output)
}

pub fn subset_table(table: &Table, mode: &SubsetMode, config: &SubsetConfig) -> Result<Table> {
    match mode {
        SubsetMode::Fraction(fraction) => sample_fraction(table, *fraction, config.seed),
        SubsetMode::PerClass { cap, labels } => sample_per_class(
            table,
            &config.label_column,
            *cap,
            labels.as_deref(),
            config.seed,
        ),
    }
}

pub fn run_subset(
    input: &Path,
    output: &Path,
    mode: &SubsetMode,
    config: &SubsetConfig,
) -> Result<RunReport> {
    info!("Reading file: {:?}", input);
    let table = Table::read_csv(input)?;
    let subset = subset_table(&table, mode, config)?;
    subset.write_csv(output)?;
    info!("Subset with {} rows saved to {:?}", subset.len(), output);

    if let Some(label_idx) = subset.column_index(&config.label_column) {
        for (label, count) in value_counts(&subset, label_idx) {
            info!("  {:<20} {}", label, count);
        }
    }

    let mut report = RunReport::new("rows");
    report.processed = subset.len();
    Ok(report)
}
