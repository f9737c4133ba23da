use std::path::Path;
use std::sync::mpsc::Sender;

use chrono::DateTime;
use log::{debug, error};
use pcap::Linktype;
use pnet::packet::{
    ethernet::{EtherTypes, EthernetPacket},
    ipv4::Ipv4Packet,
    ipv6::Ipv6Packet,
    Packet,
};

use crate::{
    error::Result, flow_table::FlowTable, flows::flow::Flow, packet_features::PacketFeatures,
};

// Define constants for Linux cooked capture EtherTypes
const SLL_IPV4: u16 = 0x0800;
const SLL_IPV6: u16 = 0x86DD;
// Define constant for 802.1Q VLAN EtherType
const ETHERTYPE_VLAN: u16 = 0x8100;
const SLL_HEADER_LEN: usize = 16;
const VLAN_HEADER_LEN: usize = 4;

/// Flow-table tuning for one capture.
#[derive(Debug, Clone, Copy)]
pub struct FlowTimeouts {
    pub active_timeout: u64,
    pub idle_timeout: u64,
    pub expiration_check_interval: u64,
}

/// Packet counters of one capture read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    pub packets: u64,
    pub parsed: u64,
    pub ignored: u64,
}

/// Reads every packet of a capture file into a flow table and exports all
/// flows on `output_channel`, the open ones last in order of first packet.
pub fn read_pcap_file<T>(
    path: &Path,
    output_channel: Sender<T>,
    timeouts: FlowTimeouts,
) -> Result<CaptureStats>
where
    T: Flow,
{
    debug!("Opening the pcap file: {:?} ...", path);
    let mut pcap_capture = pcap::Capture::from_file(path).map_err(|e| {
        error!("Error opening file {:?}: {:?}", path, e);
        e
    })?;
    let linktype = pcap_capture.get_datalink();

    let mut flow_table = FlowTable::new(
        timeouts.active_timeout,
        timeouts.idle_timeout,
        output_channel,
        timeouts.expiration_check_interval,
    );
    let mut stats = CaptureStats::default();
    let mut last_timestamp_us = None;

    debug!("Reading the pcap file: {:?} ...", path);
    while let Ok(packet) = pcap_capture.next_packet() {
        stats.packets += 1;
        let Some(timestamp_us) = DateTime::from_timestamp(
            packet.header.ts.tv_sec as i64,
            (packet.header.ts.tv_usec as u32).saturating_mul(1000),
        )
        .map(|ts| ts.timestamp_micros()) else {
            debug!("Packet with an unrepresentable timestamp skipped");
            stats.ignored += 1;
            continue;
        };

        match extract_packet_features(linktype, packet.data, timestamp_us) {
            Some(packet_features) => {
                stats.parsed += 1;
                last_timestamp_us = Some(timestamp_us);
                flow_table.process_packet(&packet_features);
            }
            None => stats.ignored += 1,
        }
    }

    if let Some(timestamp_us) = last_timestamp_us {
        debug!("Flushing {} open flows", flow_table.open_flows());
        flow_table.export_all_flows(timestamp_us);
    }
    debug!(
        "Finished reading the pcap file: {:?} ({} packets, {} ignored)",
        path, stats.packets, stats.ignored
    );
    Ok(stats)
}

/// Decodes link and network layers down to the transport features.
pub fn extract_packet_features(
    linktype: Linktype,
    data: &[u8],
    timestamp_us: i64,
) -> Option<PacketFeatures> {
    match linktype {
        Linktype::LINUX_SLL => from_linux_cooked(data, timestamp_us),
        Linktype::RAW | Linktype::IPV4 | Linktype::IPV6 => from_raw_ip(data, timestamp_us),
        _ => from_ethernet(data, timestamp_us),
    }
}

fn from_ethernet(data: &[u8], timestamp_us: i64) -> Option<PacketFeatures> {
    let ethernet = EthernetPacket::new(data)?;
    match ethernet.get_ethertype() {
        EtherTypes::Ipv4 => from_ethertype(SLL_IPV4, ethernet.payload(), timestamp_us),
        EtherTypes::Ipv6 => from_ethertype(SLL_IPV6, ethernet.payload(), timestamp_us),
        EtherTypes::Vlan => from_vlan(ethernet.payload(), timestamp_us),
        other => {
            debug!("Unsupported EtherType: {}", other);
            None
        }
    }
}

fn from_linux_cooked(data: &[u8], timestamp_us: i64) -> Option<PacketFeatures> {
    if data.len() < SLL_HEADER_LEN {
        debug!("Linux cooked capture packet too short");
        return None;
    }
    let ethertype = u16::from_be_bytes([data[14], data[15]]);
    match ethertype {
        ETHERTYPE_VLAN => from_vlan(&data[SLL_HEADER_LEN..], timestamp_us),
        _ => from_ethertype(ethertype, &data[SLL_HEADER_LEN..], timestamp_us),
    }
}

/// Handles 802.1Q VLAN tagged packets.
///
/// VLAN header is 4 bytes: 2 bytes for VLAN tag and 2 bytes for inner EtherType.
fn from_vlan(payload: &[u8], timestamp_us: i64) -> Option<PacketFeatures> {
    if payload.len() < VLAN_HEADER_LEN {
        debug!("VLAN packet too short to contain inner EtherType");
        return None;
    }
    let inner_ethertype = u16::from_be_bytes([payload[2], payload[3]]);
    from_ethertype(inner_ethertype, &payload[VLAN_HEADER_LEN..], timestamp_us)
}

fn from_raw_ip(data: &[u8], timestamp_us: i64) -> Option<PacketFeatures> {
    match data.first()? >> 4 {
        4 => from_ethertype(SLL_IPV4, data, timestamp_us),
        6 => from_ethertype(SLL_IPV6, data, timestamp_us),
        _ => None,
    }
}

fn from_ethertype(ethertype: u16, payload: &[u8], timestamp_us: i64) -> Option<PacketFeatures> {
    match ethertype {
        SLL_IPV4 => {
            Ipv4Packet::new(payload).and_then(|p| PacketFeatures::from_ipv4_packet(&p, timestamp_us))
        }
        SLL_IPV6 => {
            Ipv6Packet::new(payload).and_then(|p| PacketFeatures::from_ipv6_packet(&p, timestamp_us))
        }
        _ => {
            debug!("Failed to parse packet as IPv4 or IPv6 (EtherType 0x{:04x})", ethertype);
            None
        }
    }
}
