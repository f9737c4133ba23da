use std::net::IpAddr;

use pnet::packet::{
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::Ipv4Packet,
    ipv6::Ipv6Packet,
    tcp::{TcpFlags, TcpPacket},
    udp::UdpPacket,
    Packet,
};

use crate::protocols::{
    dns::{is_dns_port, parse_dns, DnsSummary},
    http::parse_http_status,
};

/// Fixed IPv6 header length, added to the payload length to get the packet size.
const IPV6_HEADER_LEN: u16 = 40;

/// The per-packet view the flow table works on.
#[derive(Debug, Clone)]
pub struct PacketFeatures {
    pub source_ip: IpAddr,
    pub destination_ip: IpAddr,
    pub source_port: u16,
    pub destination_port: u16,
    pub protocol: u8,
    pub timestamp_us: i64,
    pub fin_flag: u8,
    pub syn_flag: u8,
    pub rst_flag: u8,
    pub ack_flag: u8,
    /// Transport payload length in bytes.
    pub data_length: u16,
    /// Size of the IP packet in bytes, header included.
    pub length: u16,
    pub sequence_number: u32,
    pub sequence_number_ack: u32,
    pub dns: Option<DnsSummary>,
    pub http_status: Option<u16>,
}

impl PacketFeatures {
    /// A packet with only addressing, size and time set; flags and payload
    /// evidence are filled in by the transport parsers.
    pub fn new(
        source_ip: IpAddr,
        destination_ip: IpAddr,
        source_port: u16,
        destination_port: u16,
        protocol: u8,
        timestamp_us: i64,
        length: u16,
    ) -> Self {
        PacketFeatures {
            source_ip,
            destination_ip,
            source_port,
            destination_port,
            protocol,
            timestamp_us,
            fin_flag: 0,
            syn_flag: 0,
            rst_flag: 0,
            ack_flag: 0,
            data_length: 0,
            length,
            sequence_number: 0,
            sequence_number_ack: 0,
            dns: None,
            http_status: None,
        }
    }

    pub fn from_ipv4_packet(packet: &Ipv4Packet, timestamp_us: i64) -> Option<Self> {
        Self::from_transport(
            packet.get_source().into(),
            packet.get_destination().into(),
            packet.get_next_level_protocol(),
            packet.payload(),
            packet.get_total_length(),
            timestamp_us,
        )
    }

    pub fn from_ipv6_packet(packet: &Ipv6Packet, timestamp_us: i64) -> Option<Self> {
        Self::from_transport(
            packet.get_source().into(),
            packet.get_destination().into(),
            packet.get_next_header(),
            packet.payload(),
            packet.get_payload_length().saturating_add(IPV6_HEADER_LEN),
            timestamp_us,
        )
    }

    fn from_transport(
        source_ip: IpAddr,
        destination_ip: IpAddr,
        protocol: IpNextHeaderProtocol,
        payload: &[u8],
        length: u16,
        timestamp_us: i64,
    ) -> Option<Self> {
        match protocol {
            IpNextHeaderProtocols::Tcp => {
                let tcp = TcpPacket::new(payload)?;
                let flags = tcp.get_flags();
                let mut features = PacketFeatures::new(
                    source_ip,
                    destination_ip,
                    tcp.get_source(),
                    tcp.get_destination(),
                    protocol.0,
                    timestamp_us,
                    length,
                );
                features.fin_flag = u8::from(flags & TcpFlags::FIN != 0);
                features.syn_flag = u8::from(flags & TcpFlags::SYN != 0);
                features.rst_flag = u8::from(flags & TcpFlags::RST != 0);
                features.ack_flag = u8::from(flags & TcpFlags::ACK != 0);
                features.data_length = tcp.payload().len() as u16;
                features.sequence_number = tcp.get_sequence();
                features.sequence_number_ack = tcp.get_acknowledgement();
                features.http_status = parse_http_status(tcp.payload());
                Some(features)
            }
            IpNextHeaderProtocols::Udp => {
                let udp = UdpPacket::new(payload)?;
                let mut features = PacketFeatures::new(
                    source_ip,
                    destination_ip,
                    udp.get_source(),
                    udp.get_destination(),
                    protocol.0,
                    timestamp_us,
                    length,
                );
                features.data_length = udp.payload().len() as u16;
                if is_dns_port(udp.get_source()) || is_dns_port(udp.get_destination()) {
                    features.dns = parse_dns(udp.payload());
                }
                Some(features)
            }
            // Portless protocols (ICMP, GRE, ...) still form flows between two hosts.
            _ => Some(PacketFeatures::new(
                source_ip,
                destination_ip,
                0,
                0,
                protocol.0,
                timestamp_us,
                length,
            )),
        }
    }

    /// Generates a flow key based on IPs, ports, and protocol
    pub fn flow_key(&self) -> String {
        format!(
            "{}:{}-{}:{}-{}",
            self.source_ip,
            self.source_port,
            self.destination_ip,
            self.destination_port,
            self.protocol
        )
    }

    /// Generates a flow key based on IPs, ports, and protocol in the reverse direction
    pub fn flow_key_bwd(&self) -> String {
        format!(
            "{}:{}-{}:{}-{}",
            self.destination_ip,
            self.destination_port,
            self.source_ip,
            self.source_port,
            self.protocol
        )
    }
}
