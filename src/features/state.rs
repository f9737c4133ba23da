use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Connection state as seen from the packet counts of a flow.
///
/// Text form uses Zeek's labels; `S1` parses as `Established` since older
/// datasets wrote established flows that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum FlowState {
    #[strum(serialize = "S0")]
    NoReply,
    #[strum(to_string = "SF", serialize = "S1")]
    Established,
    #[strum(serialize = "OTH")]
    Other,
}

impl FlowState {
    /// Classifies a flow from its per-direction packet counts.
    pub fn classify(src_packets: f64, dst_packets: f64) -> Self {
        if src_packets > 0.0 && dst_packets == 0.0 {
            FlowState::NoReply
        } else if src_packets > 0.0 && dst_packets > 0.0 {
            FlowState::Established
        } else {
            FlowState::Other
        }
    }

    /// Fixed integer encoding shared by every stage.
    pub fn code(&self) -> i64 {
        match self {
            FlowState::Other => 0,
            FlowState::NoReply => 1,
            FlowState::Established => 2,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FlowState::NoReply => "no-reply",
            FlowState::Established => "established",
            FlowState::Other => "other",
        }
    }
}
