use strum_macros::{Display, EnumString};

use crate::packet_features::PacketFeatures;

const TCP: u8 = 6;

/// Zeek-style summary of how a connection went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ConnState {
    /// Connection attempt seen, no reply.
    S0,
    /// Connection attempt rejected with a reset.
    REJ,
    /// Established, not terminated.
    S1,
    /// Established and closed normally.
    SF,
    /// Established, originator aborted with a reset.
    RSTO,
    /// Established, responder aborted with a reset.
    RSTR,
    /// No handshake seen.
    OTH,
}

/// The handshake and teardown events of one flow, per direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnHistory {
    protocol: u8,
    orig_packets: u64,
    resp_packets: u64,
    orig_syn: bool,
    resp_syn_ack: bool,
    resp_rst_before_established: bool,
    orig_fin: bool,
    resp_fin: bool,
    orig_rst: bool,
    resp_rst: bool,
}

impl ConnHistory {
    pub fn new(protocol: u8) -> Self {
        ConnHistory {
            protocol,
            ..Default::default()
        }
    }

    pub fn update(&mut self, packet: &PacketFeatures, is_forward: bool) {
        if is_forward {
            self.orig_packets += 1;
        } else {
            self.resp_packets += 1;
        }
        if self.protocol != TCP {
            return;
        }

        let syn = packet.syn_flag > 0;
        let ack = packet.ack_flag > 0;
        if is_forward {
            self.orig_syn |= syn && !ack;
            self.orig_fin |= packet.fin_flag > 0;
            self.orig_rst |= packet.rst_flag > 0;
        } else {
            self.resp_syn_ack |= syn && ack;
            self.resp_fin |= packet.fin_flag > 0;
            if packet.rst_flag > 0 {
                if !self.resp_syn_ack {
                    self.resp_rst_before_established = true;
                }
                self.resp_rst = true;
            }
        }
    }

    pub fn state(&self) -> ConnState {
        if self.protocol != TCP {
            return match (self.orig_packets > 0, self.resp_packets > 0) {
                (true, false) => ConnState::S0,
                (true, true) => ConnState::SF,
                _ => ConnState::OTH,
            };
        }

        if !self.orig_syn {
            return ConnState::OTH;
        }
        if !self.resp_syn_ack {
            if self.resp_rst_before_established {
                return ConnState::REJ;
            }
            return if self.resp_packets == 0 {
                ConnState::S0
            } else {
                ConnState::OTH
            };
        }
        if self.orig_rst {
            ConnState::RSTO
        } else if self.resp_rst {
            ConnState::RSTR
        } else if self.orig_fin && self.resp_fin {
            ConnState::SF
        } else {
            ConnState::S1
        }
    }
}
