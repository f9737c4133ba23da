use std::net::IpAddr;

use crate::packet_features::PacketFeatures;

use super::util::FlowExpireCause;

/// `Flow` defines the behavior of a network flow held in a flow table.
///
/// Implementors accumulate packets in both directions and decide on their own
/// termination and expiry.
pub trait Flow {
    /// Constructs a new `Flow` from the first packet's addressing.
    ///
    /// ### Arguments
    ///
    /// * `flow_key` - A unique identifier for the flow.
    /// * `ip_source` - The source IP address.
    /// * `port_source` - The source port.
    /// * `ip_destination` - The destination IP address.
    /// * `port_destination` - The destination port.
    /// * `protocol` - The protocol number.
    /// * `timestamp_us` - Time of the first packet in microseconds.
    fn new(
        flow_key: String,
        ip_source: IpAddr,
        port_source: u16,
        ip_destination: IpAddr,
        port_destination: u16,
        protocol: u8,
        timestamp_us: i64,
    ) -> Self;

    /// Updates the flow with a new packet.
    ///
    /// Returns `true` when the packet terminated the flow.
    fn update_flow(&mut self, packet: &PacketFeatures, fwd: bool) -> bool;

    /// Marks the flow as finished at `timestamp_us` for the given reason.
    fn close_flow(&mut self, timestamp_us: i64, cause: FlowExpireCause);

    fn flow_key(&self) -> &String;

    fn get_first_timestamp_us(&self) -> i64;

    /// Checks the active and idle timeouts (in seconds) against `timestamp_us`.
    fn is_expired(
        &self,
        timestamp_us: i64,
        active_timeout: u64,
        idle_timeout: u64,
    ) -> (bool, FlowExpireCause);
}
