use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};

use crate::{
    config::NbaiotConfig,
    enricher::parse_numeric,
    error::{PipelineError, Result, RunReport},
    features::{
        entropy::{histogram_entropy, HISTOGRAM_EPSILON},
        mutual_info::{discretize, mutual_information},
        signal::{
            SignalParams, HH_L001_WEIGHT, HH_L3_WEIGHT, HPHP_L001_MAGNITUDE, HPHP_L001_MEAN,
            HPHP_L001_STD, HPHP_L001_WEIGHT, MI_DIR_L5_WEIGHT,
        },
        stats::{l2_norm, sum_of_squares, FeatureStats},
        wavelet::{wavedec, zero_pad, MIN_SIGNAL_LEN},
    },
    table::{format_float, Table},
};

const FIVE_TUPLE: [&str; 5] = ["src-ip", "dst-ip", "src-port", "dst-port", "protocol"];

/// The rows of one flow, in input order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlowGroup {
    pub src_bytes: Vec<f64>,
    pub dst_bytes: Vec<f64>,
    pub label: String,
}

/// N-BaIoT style features of one flow group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFeatures {
    pub mi_dir_l5_weight: f64,
    pub hh_l3_weight: f64,
    pub hh_l001_weight: f64,
    pub hphp_weight: f64,
    pub hphp_mean: f64,
    pub hphp_std: f64,
    pub hphp_magnitude: f64,
}

pub fn output_headers(flow_id_column: &str) -> Vec<String> {
    [
        flow_id_column,
        MI_DIR_L5_WEIGHT,
        HH_L3_WEIGHT,
        HH_L001_WEIGHT,
        HPHP_L001_WEIGHT,
        HPHP_L001_MEAN,
        HPHP_L001_STD,
        HPHP_L001_MAGNITUDE,
        "label",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

/// Identifier of a row: the flow id column when present, else the 5-tuple.
fn flow_id(table: &Table, row: &[String], flow_id_column: &str) -> Result<String> {
    if table.has_column(flow_id_column) {
        return table
            .cell(row, flow_id_column)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::malformed(flow_id_column, "missing value"));
    }
    let parts = FIVE_TUPLE
        .iter()
        .map(|field| {
            table
                .cell(row, field)
                .ok_or_else(|| PipelineError::malformed(field, "missing value"))
        })
        .collect::<Result<Vec<&str>>>()?;
    Ok(parts.join("-"))
}

/// Groups rows by flow id, keyed in sorted order.
pub fn group_flows(
    table: &Table,
    flow_id_column: &str,
    report: &mut RunReport,
) -> Result<BTreeMap<String, FlowGroup>> {
    table.require_column("src-ip-bytes")?;
    table.require_column("dst-ip-bytes")?;
    table.require_column("label")?;
    if !table.has_column(flow_id_column) {
        for field in FIVE_TUPLE {
            table.require_column(field)?;
        }
    }

    let mut groups: BTreeMap<String, FlowGroup> = BTreeMap::new();
    for (index, row) in table.rows.iter().enumerate() {
        let parsed = flow_id(table, row, flow_id_column).and_then(|id| {
            let src = numeric_cell(table, row, "src-ip-bytes")?;
            let dst = numeric_cell(table, row, "dst-ip-bytes")?;
            Ok((id, src, dst))
        });
        match parsed {
            Ok((id, src, dst)) => {
                let group = groups.entry(id).or_insert_with(|| FlowGroup {
                    label: table.cell(row, "label").unwrap_or_default().to_string(),
                    ..Default::default()
                });
                group.src_bytes.push(src);
                group.dst_bytes.push(dst);
            }
            Err(e) => {
                warn!("Skipping row {}: {}", index, e);
                report.record_error(&e);
            }
        }
    }
    Ok(groups)
}

fn numeric_cell(table: &Table, row: &[String], field: &str) -> Result<f64> {
    let text = table
        .cell(row, field)
        .ok_or_else(|| PipelineError::malformed(field, "missing value"))?;
    parse_numeric(field, text)?
        .as_f64()
        .ok_or_else(|| PipelineError::malformed(field, "not a number"))
}

/// Computes the grouped features from the source byte series of a flow.
///
/// The mutual information is taken between the unpadded source and destination
/// series; everything else works on the source series padded to four values.
pub fn group_features(group: &FlowGroup, params: &SignalParams) -> Result<GroupFeatures> {
    if group.src_bytes.is_empty() {
        return Err(PipelineError::Computation("empty flow group".to_string()));
    }
    let signal = zero_pad(&group.src_bytes, MIN_SIGNAL_LEN);

    let mi_dir_l5_weight =
        mutual_information(&discretize(&group.src_bytes), &discretize(&group.dst_bytes))?;
    let hh_l3_weight = histogram_entropy(&signal, params.bins_l3, HISTOGRAM_EPSILON)?;
    let hh_l001_weight = histogram_entropy(&signal, params.bins_l001, HISTOGRAM_EPSILON)?;

    let decomposition = wavedec(&signal, params.wavelet_level)?;
    let approx = &decomposition.approximation;
    let approx_stats = FeatureStats::from_values(approx);

    Ok(GroupFeatures {
        mi_dir_l5_weight,
        hh_l3_weight,
        hh_l001_weight,
        hphp_weight: sum_of_squares(approx),
        hphp_mean: approx_stats.get_mean(),
        hphp_std: approx_stats.get_std(),
        hphp_magnitude: l2_norm(approx),
    })
}

/// Builds the per-flow feature table of a raw per-packet or per-flow table.
pub fn nbaiot_table(table: &Table, config: &NbaiotConfig) -> Result<(Table, RunReport)> {
    let mut report = RunReport::new("flows");
    let groups = group_flows(table, &config.flow_id_column, &mut report)?;
    let mut output = Table::new(output_headers(&config.flow_id_column));

    for (id, group) in groups {
        match group_features(&group, &config.signal) {
            Ok(features) => {
                let mut row = vec![id];
                row.extend(
                    [
                        features.mi_dir_l5_weight,
                        features.hh_l3_weight,
                        features.hh_l001_weight,
                        features.hphp_weight,
                        features.hphp_mean,
                        features.hphp_std,
                        features.hphp_magnitude,
                    ]
                    .into_iter()
                    .map(format_float),
                );
                row.push(group.label);
                output.rows.push(row);
                report.record_processed();
            }
            Err(e) => {
                warn!("Error in flow {}: {}", id, e);
                report.record_error(&e);
            }
        }
    }
    Ok((output, report))
}

pub fn run_nbaiot(input: &Path, output: &Path, config: &NbaiotConfig) -> Result<RunReport> {
    info!("Reading {:?}", input);
    let table = Table::read_csv(input)?;

    info!("Extracting features per flow ...");
    let (features, report) = nbaiot_table(&table, config)?;
    features.write_csv(output)?;
    info!("N-BaIoT style features saved to {:?}", output);

    report.log_summary("nbaiot");
    Ok(report)
}
