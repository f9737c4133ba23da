use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::flows::conn_state::ConnState;

/// One observed bidirectional conversation, as exported by the flow table.
///
/// Application-layer fields stay `None` when the flow carried no evidence for
/// them; [`BaseFlowRow::from_record`] decides what gets written instead.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
    /// First packet of the flow, epoch milliseconds.
    pub first_seen_ms: f64,
    pub src2dst_bytes: u64,
    pub dst2src_bytes: u64,
    pub src2dst_packets: u64,
    pub dst2src_packets: u64,
    pub dns_query: Option<String>,
    pub dns_rejected: Option<bool>,
    pub dns_rd: Option<bool>,
    pub conn_state: Option<ConnState>,
    pub service: Option<String>,
    pub http_status: Option<u16>,
}

/// Values written for flow fields the capture gave no evidence for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowDefaults {
    pub dns_query: String,
    pub state: String,
    pub service: String,
    pub http_status_code: i32,
}

impl Default for RowDefaults {
    fn default() -> Self {
        RowDefaults {
            dns_query: String::new(),
            state: "OTH".to_string(),
            service: "-".to_string(),
            http_status_code: -1,
        }
    }
}

/// A row of a `_base.csv` file: the raw per-flow columns the enricher consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFlowRow {
    #[serde(rename = "src-ip")]
    pub src_ip: String,
    #[serde(rename = "dst-ip")]
    pub dst_ip: String,
    #[serde(rename = "src-port")]
    pub src_port: u16,
    #[serde(rename = "dst-port")]
    pub dst_port: u16,
    pub protocol: u8,
    pub stime: f64,
    #[serde(rename = "dns-query")]
    pub dns_query: String,
    #[serde(rename = "dns-rejected")]
    pub dns_rejected: u8,
    #[serde(rename = "dns-RD")]
    pub dns_rd: u8,
    pub state: String,
    pub service: String,
    #[serde(rename = "http-status-code")]
    pub http_status_code: i32,
    #[serde(rename = "src-ip-bytes")]
    pub src_ip_bytes: u64,
    #[serde(rename = "dst-ip-bytes")]
    pub dst_ip_bytes: u64,
    pub src2dst_packets: u64,
    pub dst2src_packets: u64,
    pub label: String,
}

impl BaseFlowRow {
    pub fn from_record(record: &FlowRecord, label: &str, defaults: &RowDefaults) -> Self {
        BaseFlowRow {
            src_ip: record.src_ip.to_string(),
            dst_ip: record.dst_ip.to_string(),
            src_port: record.src_port,
            dst_port: record.dst_port,
            protocol: record.protocol,
            stime: record.first_seen_ms,
            dns_query: record
                .dns_query
                .clone()
                .unwrap_or_else(|| defaults.dns_query.clone()),
            dns_rejected: record.dns_rejected.unwrap_or(false) as u8,
            dns_rd: record.dns_rd.unwrap_or(false) as u8,
            state: record
                .conn_state
                .map(|state| state.to_string())
                .unwrap_or_else(|| defaults.state.clone()),
            service: record
                .service
                .clone()
                .unwrap_or_else(|| defaults.service.clone()),
            http_status_code: record
                .http_status
                .map(i32::from)
                .unwrap_or(defaults.http_status_code),
            src_ip_bytes: record.src2dst_bytes,
            dst_ip_bytes: record.dst2src_bytes,
            src2dst_packets: record.src2dst_packets,
            dst2src_packets: record.dst2src_packets,
            label: label.to_string(),
        }
    }
}
