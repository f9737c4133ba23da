use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::{
    config::ExtractConfig,
    error::{ErrorKind, PipelineError, Result, RunReport},
    flows::bi_flow::BiFlow,
    pcap::{read_pcap_file, FlowTimeouts},
    records::{BaseFlowRow, FlowRecord, RowDefaults},
};

/// Extracts one base CSV per capture found under `pcap_dir`.
///
/// Every flow of a capture is labeled with its parent folder name passed
/// through the label table. Captures in unmapped folders, captures that cannot
/// be read and captures whose output already exists are skipped.
pub fn run_extract(pcap_dir: &Path, output_dir: &Path, config: &ExtractConfig) -> Result<RunReport> {
    if !pcap_dir.is_dir() {
        return Err(PipelineError::MissingInput(pcap_dir.to_path_buf()));
    }
    fs::create_dir_all(output_dir)?;

    let captures = find_captures(pcap_dir, &config.extensions)?;
    info!("Found {} capture files under {:?}", captures.len(), pcap_dir);

    let mut report = RunReport::new("captures");
    for capture in captures {
        let label = match label_for(&capture, &config.label_mapping) {
            Ok(label) => label,
            Err(e) => {
                warn!("Skipping {:?}: {}", capture, e);
                report.record_error(&e);
                continue;
            }
        };

        let output_path = output_dir.join(output_name(&capture, &config.output_suffix));
        if output_path.exists() {
            info!("Already exists: {:?}, skipped", output_path);
            report.already_done += 1;
            continue;
        }

        info!("Processing {:?} as {}", capture, label);
        let start = Instant::now();
        let records = match extract_flows(&capture, config) {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping {:?}: {}", capture, e);
                report.record_error(&e);
                continue;
            }
        };
        info!(
            "Read {} flows in {:.2} seconds",
            records.len(),
            start.elapsed().as_secs_f64()
        );

        if records.is_empty() {
            info!("No flows in {:?}, nothing written", capture);
            report.record_processed();
            continue;
        }

        match write_base_csv(&output_path, &records, &label, &config.row_defaults) {
            Ok(()) => {
                info!("Saved {:?}", output_path);
                report.record_processed();
            }
            Err(e) => {
                warn!("Failed to write {:?}: {}", output_path, e);
                report.record_error(&e);
            }
        }
    }

    let unmapped = report.skipped_of(ErrorKind::UnmappedLabel);
    if unmapped > 0 {
        warn!(
            "{} captures sit in folders without a label mapping",
            unmapped
        );
    }
    report.log_summary("extract");
    Ok(report)
}

/// Reads one capture and returns its flows in export order.
pub fn extract_flows(path: &Path, config: &ExtractConfig) -> Result<Vec<FlowRecord>> {
    let (sender, receiver) = mpsc::channel::<BiFlow>();
    let timeouts = FlowTimeouts {
        active_timeout: config.active_timeout,
        idle_timeout: config.idle_timeout,
        expiration_check_interval: config.expiration_check_interval,
    };

    let stats = read_pcap_file(path, sender, timeouts)?;
    debug!(
        "{:?}: {} packets, {} parsed, {} ignored",
        path, stats.packets, stats.parsed, stats.ignored
    );

    Ok(receiver
        .iter()
        .map(|flow| {
            debug!("Flow {} ended: {:?}", flow.flow_key, flow.flow_expire_cause);
            flow.to_record()
        })
        .collect())
}

/// The label of a capture: its parent folder name looked up in `mapping`.
pub fn label_for(capture: &Path, mapping: &BTreeMap<String, String>) -> Result<String> {
    let folder = capture
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    mapping
        .get(&folder)
        .cloned()
        .ok_or(PipelineError::UnmappedLabel(folder))
}

/// Walks `dir` recursively for files with one of `extensions`, in sorted order.
///
/// Symlinked folders are not descended into.
pub fn find_captures(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut captures = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if has_extension(&path, extensions) {
                captures.push(path);
            }
        }
    }

    captures.sort();
    Ok(captures)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .map_or(false, |ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
}

fn output_name(capture: &Path, suffix: &str) -> String {
    let stem = capture
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", stem, suffix)
}

pub fn write_base_csv(
    path: &Path,
    records: &[FlowRecord],
    label: &str,
    defaults: &RowDefaults,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(BaseFlowRow::from_record(record, label, defaults))?;
    }
    writer.flush()?;
    Ok(())
}
