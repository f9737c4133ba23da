use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::enricher::FeatureProfile;
use crate::features::signal::SignalParams;
use crate::features::state::FlowState;
use crate::records::RowDefaults;

/// Everything the stages can be tuned with. Defaults reproduce the ToN-IoT
/// pipeline; a TOML file loaded with `--config-file` may override any part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub extract: ExtractConfig,
    pub enrich: EnrichConfig,
    pub nbaiot: NbaiotConfig,
    pub encode: EncodeConfig,
    pub label: LabelConfig,
    pub subset: SubsetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Capture folder name -> label written to every flow of that folder.
    pub label_mapping: BTreeMap<String, String>,
    /// The maximum time a flow is allowed to last in seconds
    pub active_timeout: u64,
    /// The maximum time with no packets for a flow in seconds
    pub idle_timeout: u64,
    /// Interval of capture time between two sweeps for expired flows, in seconds
    pub expiration_check_interval: u64,
    pub extensions: Vec<String>,
    pub output_suffix: String,
    pub row_defaults: RowDefaults,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let label_mapping = [
            ("Normal", "normal"),
            ("NormalDdos", "ddos"),
            ("NormalDos", "dos"),
            ("NormalBackdoor", "backdoor"),
            ("NormalRunsomware", "ransomware"),
            ("NormalScanning", "scanning"),
            ("NormalXss", "xss"),
            ("PasswordNormal", "password"),
            ("InjectionNormal", "injection"),
            ("MITM", "mitm"),
        ]
        .iter()
        .map(|(folder, label)| (folder.to_string(), label.to_string()))
        .collect();

        ExtractConfig {
            label_mapping,
            active_timeout: 1800,
            idle_timeout: 120,
            expiration_check_interval: 60,
            extensions: vec!["pcap".to_string(), "pcapng".to_string()],
            output_suffix: "_base.csv".to_string(),
            row_defaults: RowDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Columns a row must carry, non-empty, to be enriched.
    pub required_fields: Vec<String>,
    pub profile: FeatureProfile,
    /// Replaces the profile's column list when set.
    pub selected_features: Option<Vec<String>>,
    pub signal: SignalParams,
    pub input_suffix: String,
    pub output_suffix: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        EnrichConfig {
            required_fields: to_strings(&[
                "src-ip",
                "dst-ip",
                "src2dst_packets",
                "dst2src_packets",
                "src-ip-bytes",
                "dst-ip-bytes",
                "protocol",
                "dst-port",
                "stime",
                "label",
            ]),
            profile: FeatureProfile::TonIot,
            selected_features: None,
            signal: SignalParams::default(),
            input_suffix: "_base.csv".to_string(),
            output_suffix: "_combined.csv".to_string(),
        }
    }
}

impl EnrichConfig {
    /// The output column list: the explicit override, else the profile's list.
    pub fn feature_list(&self) -> Vec<String> {
        match &self.selected_features {
            Some(features) => features.clone(),
            None => to_strings(self.profile.features()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NbaiotConfig {
    pub flow_id_column: String,
    pub signal: SignalParams,
}

impl Default for NbaiotConfig {
    fn default() -> Self {
        NbaiotConfig {
            flow_id_column: "flow_id".to_string(),
            signal: SignalParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub input_suffix: String,
    pub output_suffix: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        EncodeConfig {
            numeric_columns: to_strings(&[
                "dns-rejected",
                "dns-RD",
                "src-bytes",
                "dst-ip-bytes",
                "MI-dir-L5-weight",
                "HH-L3-weight",
                "HH-L0.01-weight",
                "HpHp-L0.01-weight",
                "HpHp-L0.01-mean",
                "HpHp-L0.01-std",
                "HpHp-L0.01-magnitude",
                "N-IN-Conn-P-SrcIP",
                "N-IN-Conn-P-DstIP",
                "state-number",
                "proto-number",
                "stime",
                "max",
                "mean",
                "min",
                "stddev",
            ]),
            categorical_columns: to_strings(&["dns-query", "state", "service", "http-status-code"]),
            input_suffix: "_combined.csv".to_string(),
            output_suffix: "_processed.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub label_column: String,
    pub state_column: String,
    pub class_column: String,
    /// Textual label -> integer class.
    pub class_map: BTreeMap<String, i64>,
    /// Textual connection state -> integer code.
    pub state_map: BTreeMap<String, i64>,
    pub drop_label_column: bool,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let class_map = [
            ("normal", 0),
            ("mitm", 1),
            ("ddos", 2),
            ("dos", 3),
            ("scanning", 4),
            ("xss", 5),
            ("ransomware", 6),
            ("injection", 7),
            ("password", 8),
            ("backdoor", 9),
        ]
        .iter()
        .map(|(label, class)| (label.to_string(), *class))
        .collect();

        let mut state_map: BTreeMap<String, i64> = FlowState::iter()
            .map(|state| (state.to_string(), state.code()))
            .collect();
        state_map.insert("S1".to_string(), FlowState::Established.code());

        LabelConfig {
            label_column: "label".to_string(),
            state_column: "conn-state".to_string(),
            class_column: "class".to_string(),
            class_map,
            state_map,
            drop_label_column: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetConfig {
    pub seed: u64,
    pub fraction: f64,
    pub per_class: usize,
    pub label_column: String,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        SubsetConfig {
            seed: 42,
            fraction: 0.1,
            per_class: 1000,
            label_column: "label".to_string(),
        }
    }
}

pub(crate) fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
