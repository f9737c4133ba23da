use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    config::EnrichConfig,
    error::{PipelineError, Result, RunReport},
    features::{
        signal::{compute_signal_features, SignalParams},
        state::FlowState,
    },
    table::{files_with_suffix, format_float, swap_suffix, Table},
};

pub const N_IN_CONN_P_SRCIP: &str = "N-IN-Conn-P-SrcIP";
pub const N_IN_CONN_P_DSTIP: &str = "N-IN-Conn-P-DstIP";
pub const STATE_NUMBER: &str = "state-number";
pub const CONN_STATE: &str = "conn-state";

const TON_IOT_FEATURES: [&str; 26] = [
    "state",
    "service",
    "http-status-code",
    "src-bytes",
    "dst-ip-bytes",
    "dst-port",
    "conn-state",
    "src-pkts",
    "proto",
    "MI-dir-L5-weight",
    "HH-L3-weight",
    "HH-L0.01-weight",
    "HpHp-L0.01-weight",
    "HpHp-L0.01-mean",
    "HpHp-L0.01-std",
    "HpHp-L0.01-magnitude",
    "N-IN-Conn-P-DstIP",
    "N-IN-Conn-P-SrcIP",
    "state-number",
    "proto-number",
    "stime",
    "max",
    "mean",
    "min",
    "stddev",
    "label",
];

const BOT_IOT_FEATURES: [&str; 10] = [
    "N-IN-Conn-P-SrcIP",
    "N-IN-Conn-P-DstIP",
    "state-number",
    "proto-number",
    "stime",
    "max",
    "mean",
    "min",
    "stddev",
    "label",
];

/// Named output column lists of the enricher.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureProfile {
    /// Raw fields, N-BaIoT style signal features, IP counters and statistics.
    TonIot,
    /// IP counters, state and protocol numbers, start time and statistics.
    BotIot,
}

impl FeatureProfile {
    pub fn features(&self) -> &'static [&'static str] {
        match self {
            FeatureProfile::TonIot => &TON_IOT_FEATURES,
            FeatureProfile::BotIot => &BOT_IOT_FEATURES,
        }
    }
}

/// Every feature name the enricher can produce.
pub fn known_features() -> &'static [&'static str] {
    &TON_IOT_FEATURES
}

/// Rejects a column list naming features the enricher does not produce.
pub fn validate_features(features: &[String]) -> Result<()> {
    let unknown: Vec<&str> = features
        .iter()
        .map(String::as_str)
        .filter(|name| !known_features().contains(name))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(format!(
            "unknown features: {}",
            unknown.join(", ")
        )))
    }
}

/// Running count of flows per IP address within one enrichment run.
///
/// The caller owns one counter per direction and starts a fresh pair for
/// every input file.
#[derive(Debug, Default, Clone)]
pub struct IpCounter {
    counts: HashMap<String, u64>,
}

impl IpCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more flow for `ip` and returns the updated count.
    pub fn increment(&mut self, ip: &str) -> u64 {
        let count = self.counts.entry(ip.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    #[cfg(test)]
    pub fn get(&self, ip: &str) -> u64 {
        self.counts.get(ip).copied().unwrap_or(0)
    }

    /// Number of distinct addresses seen so far.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }
}

/// A single output cell, keeping integers distinct from floats so that
/// counters and codes are written without a fractional part.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", format_float(*v)),
            FeatureValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Parses a numeric cell, keeping integers as integers.
pub fn parse_numeric(field: &str, text: &str) -> Result<FeatureValue> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Ok(FeatureValue::Int(value));
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(FeatureValue::Float(value)),
        _ => Err(PipelineError::malformed(
            field,
            format!("'{}' is not a number", text),
        )),
    }
}

/// The extreme of a signal in the type its values share.
fn extreme(values: &[FeatureValue], pick_max: bool) -> FeatureValue {
    let ints: Option<Vec<i64>> = values
        .iter()
        .map(|v| match v {
            FeatureValue::Int(i) => Some(*i),
            _ => None,
        })
        .collect();
    match ints {
        Some(ints) => {
            let picked = if pick_max {
                ints.into_iter().max()
            } else {
                ints.into_iter().min()
            };
            FeatureValue::Int(picked.unwrap_or(0))
        }
        None => {
            let floats = values.iter().filter_map(FeatureValue::as_f64);
            let picked = if pick_max {
                floats.fold(f64::MIN, f64::max)
            } else {
                floats.fold(f64::MAX, f64::min)
            };
            FeatureValue::Float(picked)
        }
    }
}

fn required_cell<'a>(table: &'a Table, row: &'a [String], field: &str) -> Result<&'a str> {
    table
        .cell(row, field)
        .ok_or_else(|| PipelineError::malformed(field, "missing value"))
}

/// Computes every feature of one raw flow row.
///
/// The counters are incremented before the signal features are computed, so a
/// row failing later still counts as a seen connection.
pub fn enrich_row(
    table: &Table,
    row: &[String],
    params: &SignalParams,
    src_counter: &mut IpCounter,
    dst_counter: &mut IpCounter,
) -> Result<HashMap<&'static str, FeatureValue>> {
    let required = |field: &str| required_cell(table, row, field);

    let src_ip = required("src-ip")?;
    let dst_ip = required("dst-ip")?;
    let src_bytes = parse_numeric("src-ip-bytes", required("src-ip-bytes")?)?;
    let dst_bytes = parse_numeric("dst-ip-bytes", required("dst-ip-bytes")?)?;
    let src_pkts = parse_numeric("src2dst_packets", required("src2dst_packets")?)?;
    let dst_pkts = parse_numeric("dst2src_packets", required("dst2src_packets")?)?;
    let proto = parse_numeric("protocol", required("protocol")?)?;
    let dst_port = parse_numeric("dst-port", required("dst-port")?)?;
    let stime = parse_numeric("stime", required("stime")?)?;
    let label = required("label")?;

    let signal_values = [src_bytes, dst_bytes, src_pkts, dst_pkts];
    let signal: Vec<f64> = signal_values
        .iter()
        .filter_map(FeatureValue::as_f64)
        .collect();

    let conn_state = FlowState::classify(signal[2], signal[3]);
    debug!("{} -> {}: {}", src_ip, dst_ip, conn_state.description());
    let src_count = src_counter.increment(src_ip);
    let dst_count = dst_counter.increment(dst_ip);

    let signal_features = compute_signal_features(&signal, params)?;

    let text_or = |field: &str, default: &str| {
        FeatureValue::Text(table.cell(row, field).unwrap_or(default).to_string())
    };
    let http_status = match table.cell(row, "http-status-code") {
        Some(text) => parse_numeric("http-status-code", text)?,
        None => FeatureValue::Int(-1),
    };

    let [src_bytes, dst_bytes, src_pkts, _] = &signal_values;
    let mut values: HashMap<&'static str, FeatureValue> = HashMap::new();
    values.insert("state", text_or("state", "OTH"));
    values.insert("service", text_or("service", "-"));
    values.insert("http-status-code", http_status);
    values.insert("src-bytes", src_bytes.clone());
    values.insert("dst-ip-bytes", dst_bytes.clone());
    values.insert("dst-port", dst_port);
    values.insert(CONN_STATE, FeatureValue::Text(conn_state.to_string()));
    values.insert("src-pkts", src_pkts.clone());
    values.insert("proto", proto.clone());
    for (name, value) in signal_features.named() {
        values.insert(name, FeatureValue::Float(value));
    }
    values.insert(N_IN_CONN_P_SRCIP, FeatureValue::Int(src_count as i64));
    values.insert(N_IN_CONN_P_DSTIP, FeatureValue::Int(dst_count as i64));
    values.insert(STATE_NUMBER, FeatureValue::Int(conn_state.code()));
    values.insert("proto-number", proto);
    values.insert("stime", stime);
    values.insert("max", extreme(&signal_values, true));
    values.insert("mean", FeatureValue::Float(signal_features.mean));
    values.insert("min", extreme(&signal_values, false));
    values.insert("stddev", FeatureValue::Float(signal_features.stddev));
    values.insert("label", FeatureValue::Text(label.to_string()));

    Ok(values)
}

/// Enriches every row of a raw flow table.
///
/// Rows missing a required field, carrying a non-numeric counter or failing a
/// numeric routine are left out and counted in the returned report.
pub fn enrich_table(
    table: &Table,
    config: &EnrichConfig,
    src_counter: &mut IpCounter,
    dst_counter: &mut IpCounter,
) -> Result<(Table, RunReport)> {
    let features = config.feature_list();
    validate_features(&features)?;
    for field in &config.required_fields {
        table.require_column(field)?;
    }

    let mut report = RunReport::new("rows");
    let mut output = Table::new(features.clone());

    for (index, row) in table.rows.iter().enumerate() {
        if let Some(field) = config
            .required_fields
            .iter()
            .find(|field| table.cell(row, field).is_none())
        {
            debug!("Row {}: required field '{}' is missing", index, field);
            report.record_error(&PipelineError::malformed(field, "missing value"));
            continue;
        }

        match enrich_row(table, row, &config.signal, src_counter, dst_counter) {
            Ok(values) => {
                let cells = features
                    .iter()
                    .map(|name| {
                        values
                            .get(name.as_str())
                            .map(|value| value.to_string())
                            .unwrap_or_default()
                    })
                    .collect();
                output.rows.push(cells);
                report.record_processed();
            }
            Err(e) => {
                warn!("Error enriching row {}: {}", index, e);
                report.record_error(&e);
            }
        }
    }

    Ok((output, report))
}

/// Enriches every `_base.csv` of `input_dir` into a `_combined.csv` of
/// `output_dir`, with fresh IP counters per file.
pub fn run_enrich(input_dir: &Path, output_dir: &Path, config: &EnrichConfig) -> Result<RunReport> {
    if !input_dir.is_dir() {
        return Err(PipelineError::MissingInput(input_dir.to_path_buf()));
    }
    validate_features(&config.feature_list())?;
    fs::create_dir_all(output_dir)?;

    let mut files = RunReport::new("files");
    let mut rows = RunReport::new("rows");

    for input_path in files_with_suffix(input_dir, &config.input_suffix)? {
        let file_name = input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_name = swap_suffix(&file_name, &config.input_suffix, &config.output_suffix);
        let output_path = output_dir.join(&output_name);

        if output_path.exists() {
            info!("Already exists: {}, skipped", output_name);
            files.already_done += 1;
            continue;
        }

        info!("Enriching: {}", file_name);
        let result = Table::read_csv(&input_path).and_then(|table| {
            let mut src_counter = IpCounter::new();
            let mut dst_counter = IpCounter::new();
            let enriched = enrich_table(&table, config, &mut src_counter, &mut dst_counter)?;
            debug!(
                "{}: {} source and {} destination addresses",
                file_name,
                src_counter.distinct(),
                dst_counter.distinct()
            );
            Ok(enriched)
        });

        match result {
            Ok((enriched, file_rows)) => {
                file_rows.log_summary(&file_name);
                rows.absorb(&file_rows);
                if enriched.is_empty() {
                    warn!("No rows left after enriching {}, nothing written", file_name);
                    files.record_processed();
                    continue;
                }
                match enriched.write_csv(&output_path) {
                    Ok(()) => {
                        info!("Saved: {:?}", output_path);
                        files.record_processed();
                    }
                    Err(e) => {
                        warn!("Failed to write {:?}: {}", output_path, e);
                        files.record_error(&e);
                    }
                }
            }
            Err(e @ PipelineError::InvalidConfig(_)) => return Err(e),
            Err(e) => {
                warn!("Skipping {}: {}", file_name, e);
                files.record_error(&e);
            }
        }
    }

    rows.log_summary("enrich rows");
    files.log_summary("enrich");
    Ok(files)
}
