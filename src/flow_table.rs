use std::collections::HashMap;
use std::sync::mpsc::Sender;

use log::{debug, error};

use crate::{
    flows::{flow::Flow, util::FlowExpireCause},
    packet_features::PacketFeatures,
};

/// Bidirectional flow table driven by capture time.
///
/// Finished flows are sent on `export_channel` as soon as they terminate or
/// expire; [`FlowTable::export_all_flows`] drains whatever is left.
pub struct FlowTable<T> {
    flow_map: HashMap<String, T>,
    active_timeout: u64,
    idle_timeout: u64,
    export_channel: Sender<T>,
    next_check_time_us: Option<i64>,
    expiration_check_interval_us: i64,
}

impl<T> FlowTable<T>
where
    T: Flow,
{
    pub fn new(
        active_timeout: u64,
        idle_timeout: u64,
        export_channel: Sender<T>,
        expiration_check_interval: u64,
    ) -> Self {
        Self {
            flow_map: HashMap::new(),
            active_timeout,
            idle_timeout,
            export_channel,
            next_check_time_us: None,
            expiration_check_interval_us: expiration_check_interval as i64 * 1_000_000,
        }
    }

    pub fn open_flows(&self) -> usize {
        self.flow_map.len()
    }

    /// Processes a packet and updates the flow map.
    pub fn process_packet(&mut self, packet: &PacketFeatures) {
        self.check_and_export_expired_flows(packet.timestamp_us);

        // Determine the flow direction and key
        let flow_key = if self.flow_map.contains_key(&packet.flow_key_bwd()) {
            packet.flow_key_bwd()
        } else {
            packet.flow_key()
        };

        // Update the flow if it exists, otherwise create a new flow
        if let Some(mut flow) = self.flow_map.remove(&flow_key) {
            let (expired, cause) =
                flow.is_expired(packet.timestamp_us, self.active_timeout, self.idle_timeout);
            if expired {
                debug!("Flow expired: {:?}, creating new flow", flow.flow_key());
                flow.close_flow(packet.timestamp_us, cause);
                self.export_flow(flow);
                self.create_and_insert_flow(packet);
            } else {
                let is_terminated = self.update_flow_with_packet(&mut flow, packet);
                if is_terminated {
                    self.export_flow(flow);
                } else {
                    self.flow_map.insert(flow_key, flow);
                }
            }
        } else {
            debug!("Creating new flow: {:?}", packet.flow_key());
            self.create_and_insert_flow(packet);
        }
    }

    fn create_and_insert_flow(&mut self, packet: &PacketFeatures) {
        let mut new_flow = T::new(
            packet.flow_key(),
            packet.source_ip,
            packet.source_port,
            packet.destination_ip,
            packet.destination_port,
            packet.protocol,
            packet.timestamp_us,
        );
        if self.update_flow_with_packet(&mut new_flow, packet) {
            self.export_flow(new_flow);
        } else {
            self.flow_map.insert(packet.flow_key(), new_flow);
        }
    }

    /// Returns a boolean indicating if the flow is terminated.
    fn update_flow_with_packet(&self, flow: &mut T, packet: &PacketFeatures) -> bool {
        let is_forward = *flow.flow_key() == packet.flow_key();
        flow.update_flow(packet, is_forward)
    }

    /// Export all flows in the flow map in order of first packet arrival.
    pub fn export_all_flows(&mut self, timestamp_us: i64) {
        let mut flows_to_export: Vec<_> = self.flow_map.drain().map(|(_, flow)| flow).collect();

        flows_to_export.sort_by_key(|flow| flow.get_first_timestamp_us());

        for mut flow in flows_to_export {
            flow.close_flow(timestamp_us, FlowExpireCause::ExporterShutdown);
            self.export_flow(flow);
        }
    }

    pub fn export_flow(&self, flow: T) {
        if let Err(e) = self.export_channel.send(flow) {
            error!("Failed to send flow: {}", e);
        }
    }

    fn check_and_export_expired_flows(&mut self, current_time_us: i64) {
        if self
            .next_check_time_us
            .map_or(true, |next_check| current_time_us >= next_check)
        {
            self.export_expired_flows(current_time_us);
            self.next_check_time_us = Some(current_time_us + self.expiration_check_interval_us);
        }
    }

    /// Export all expired flows, oldest first.
    pub fn export_expired_flows(&mut self, timestamp_us: i64) {
        let mut expired_flows: Vec<_> = self
            .flow_map
            .iter()
            .filter_map(|(key, flow)| {
                let (expired, cause) =
                    flow.is_expired(timestamp_us, self.active_timeout, self.idle_timeout);
                expired.then(|| (key.clone(), cause, flow.get_first_timestamp_us()))
            })
            .collect();
        expired_flows.sort_by_key(|(_, _, first_timestamp)| *first_timestamp);

        if !expired_flows.is_empty() {
            debug!("Exporting {} expired flows", expired_flows.len());
        }
        for (key, cause, _) in expired_flows {
            if let Some(mut flow) = self.flow_map.remove(&key) {
                flow.close_flow(timestamp_us, cause);
                self.export_flow(flow);
            }
        }
    }
}
