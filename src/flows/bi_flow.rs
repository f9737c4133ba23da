use std::net::IpAddr;

use crate::{packet_features::PacketFeatures, records::FlowRecord};

use super::{
    conn_state::ConnHistory,
    flow::Flow,
    util::{port_service, FlowExpireCause},
};

#[derive(Clone, PartialEq, Debug)]
pub(crate) enum TcpTeardown {
    Established,
    FinSent,
    FinAcked,
}

/// A bidirectional flow: byte and packet counters per direction, the TCP
/// handshake history and whatever DNS / HTTP evidence the payloads carried.
#[derive(Clone, Debug)]
pub struct BiFlow {
    pub flow_key: String,
    pub ip_source: IpAddr,
    pub ip_destination: IpAddr,
    pub port_source: u16,
    pub port_destination: u16,
    pub protocol: u8,
    pub first_timestamp_us: i64,
    pub last_timestamp_us: i64,
    pub fwd_bytes: u64,
    pub bwd_bytes: u64,
    pub fwd_packets: u64,
    pub bwd_packets: u64,
    pub dns_query: Option<String>,
    pub dns_rd: Option<bool>,
    pub dns_rejected: Option<bool>,
    pub http_status: Option<u16>,
    pub flow_expire_cause: Option<FlowExpireCause>,
    history: ConnHistory,

    // Tracking TCP Flow Termination
    pub(crate) state_fwd: TcpTeardown,
    pub(crate) state_bwd: TcpTeardown,
    expected_ack_seq_fwd: Option<u32>,
    expected_ack_seq_bwd: Option<u32>,
}

impl BiFlow {
    /// Checks if the flow is finished.
    ///
    /// A flow is considered finished when both FIN flags are set and the last ACK is received,
    /// and the sequence numbers have been acknowledged by both parties.
    pub fn is_tcp_finished(&mut self, packet: &PacketFeatures, forward: bool) -> bool {
        if packet.fin_flag > 0 {
            let expected = packet
                .sequence_number
                .wrapping_add(packet.data_length as u32)
                .wrapping_add(1);
            if forward {
                self.state_fwd = TcpTeardown::FinSent;
                self.expected_ack_seq_bwd = Some(expected);
            } else {
                self.state_bwd = TcpTeardown::FinSent;
                self.expected_ack_seq_fwd = Some(expected);
            }
        }

        if self.state_bwd == TcpTeardown::FinSent
            && forward
            && Some(packet.sequence_number_ack) == self.expected_ack_seq_fwd
        {
            self.state_bwd = TcpTeardown::FinAcked;
        } else if self.state_fwd == TcpTeardown::FinSent
            && !forward
            && Some(packet.sequence_number_ack) == self.expected_ack_seq_bwd
        {
            self.state_fwd = TcpTeardown::FinAcked;
        }

        self.state_fwd == TcpTeardown::FinAcked && self.state_bwd == TcpTeardown::FinAcked
    }

    fn update_application(&mut self, packet: &PacketFeatures) {
        if let Some(dns) = &packet.dns {
            if self.dns_query.is_none() {
                self.dns_query = dns.query.clone();
            }
            if self.dns_rd.is_none() && !dns.is_response {
                self.dns_rd = Some(dns.recursion_desired);
            }
            if dns.is_response {
                let rejected = self.dns_rejected.unwrap_or(false) || dns.is_rejected();
                self.dns_rejected = Some(rejected);
            }
        }
        if self.http_status.is_none() {
            self.http_status = packet.http_status;
        }
    }

    /// Payload evidence wins over the port table.
    pub fn service(&self) -> Option<String> {
        if self.dns_query.is_some() || self.dns_rejected.is_some() {
            return Some("dns".to_string());
        }
        if self.http_status.is_some() {
            return Some("http".to_string());
        }
        port_service(self.port_source, self.port_destination).map(str::to_string)
    }

    pub fn to_record(&self) -> FlowRecord {
        FlowRecord {
            src_ip: self.ip_source,
            dst_ip: self.ip_destination,
            src_port: self.port_source,
            dst_port: self.port_destination,
            protocol: self.protocol,
            first_seen_ms: self.first_timestamp_us as f64 / 1000.0,
            src2dst_bytes: self.fwd_bytes,
            dst2src_bytes: self.bwd_bytes,
            src2dst_packets: self.fwd_packets,
            dst2src_packets: self.bwd_packets,
            dns_query: self.dns_query.clone(),
            dns_rejected: self.dns_rejected,
            dns_rd: self.dns_rd,
            conn_state: Some(self.history.state()),
            service: self.service(),
            http_status: self.http_status,
        }
    }
}

impl Flow for BiFlow {
    fn new(
        flow_key: String,
        ip_source: IpAddr,
        port_source: u16,
        ip_destination: IpAddr,
        port_destination: u16,
        protocol: u8,
        timestamp_us: i64,
    ) -> Self {
        BiFlow {
            flow_key,
            ip_source,
            ip_destination,
            port_source,
            port_destination,
            protocol,
            first_timestamp_us: timestamp_us,
            last_timestamp_us: timestamp_us,
            fwd_bytes: 0,
            bwd_bytes: 0,
            fwd_packets: 0,
            bwd_packets: 0,
            dns_query: None,
            dns_rd: None,
            dns_rejected: None,
            http_status: None,
            flow_expire_cause: None,
            history: ConnHistory::new(protocol),
            state_fwd: TcpTeardown::Established,
            state_bwd: TcpTeardown::Established,
            expected_ack_seq_fwd: None,
            expected_ack_seq_bwd: None,
        }
    }

    fn update_flow(&mut self, packet: &PacketFeatures, fwd: bool) -> bool {
        self.last_timestamp_us = packet.timestamp_us;
        if fwd {
            self.fwd_packets += 1;
            self.fwd_bytes += packet.length as u64;
        } else {
            self.bwd_packets += 1;
            self.bwd_bytes += packet.length as u64;
        }
        self.history.update(packet, fwd);
        self.update_application(packet);

        if self.protocol != 6 {
            return false;
        }
        if self.is_tcp_finished(packet, fwd) {
            self.close_flow(packet.timestamp_us, FlowExpireCause::TcpTermination);
            return true;
        }
        if packet.rst_flag > 0 {
            self.close_flow(packet.timestamp_us, FlowExpireCause::TcpReset);
            return true;
        }
        false
    }

    fn close_flow(&mut self, _timestamp_us: i64, cause: FlowExpireCause) {
        self.flow_expire_cause = Some(cause);
    }

    fn flow_key(&self) -> &String {
        &self.flow_key
    }

    fn get_first_timestamp_us(&self) -> i64 {
        self.first_timestamp_us
    }

    fn is_expired(
        &self,
        timestamp_us: i64,
        active_timeout: u64,
        idle_timeout: u64,
    ) -> (bool, FlowExpireCause) {
        if (timestamp_us - self.first_timestamp_us) / 1_000_000 > active_timeout as i64 {
            return (true, FlowExpireCause::ActiveTimeout);
        }
        if (timestamp_us - self.last_timestamp_us) / 1_000_000 > idle_timeout as i64 {
            return (true, FlowExpireCause::IdleTimeout);
        }
        (false, FlowExpireCause::ExporterShutdown)
    }
}
