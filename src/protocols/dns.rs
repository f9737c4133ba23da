//! Minimal DNS header and question parsing.

/// Ports that carry DNS over UDP.
pub const DNS_PORTS: [u16; 2] = [53, 5353];

const HEADER_LEN: usize = 12;
const MAX_POINTER_JUMPS: usize = 10;

/// What the flow record keeps from a DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsSummary {
    pub is_response: bool,
    pub recursion_desired: bool,
    pub rcode: u8,
    /// Name of the first question, if the message carried one.
    pub query: Option<String>,
}

impl DnsSummary {
    /// A response with a non-zero rcode (NXDOMAIN, REFUSED, ...).
    pub fn is_rejected(&self) -> bool {
        self.is_response && self.rcode != 0
    }
}

pub fn is_dns_port(port: u16) -> bool {
    DNS_PORTS.contains(&port)
}

/// Parses the header and first question of a DNS message.
///
/// Returns `None` when the payload is too short to be DNS or the question name
/// runs past the end of the payload.
pub fn parse_dns(payload: &[u8]) -> Option<DnsSummary> {
    if payload.len() < HEADER_LEN {
        return None;
    }

    let flags = u16::from_be_bytes([payload[2], payload[3]]);
    let opcode = ((flags >> 11) & 0x0F) as u8;
    // Only standard queries, inverse queries and status requests are DNS we expect.
    if opcode > 2 {
        return None;
    }
    let qdcount = u16::from_be_bytes([payload[4], payload[5]]);

    let query = if qdcount > 0 {
        Some(parse_name(payload, HEADER_LEN)?)
    } else {
        None
    };

    Some(DnsSummary {
        is_response: (flags & 0x8000) != 0,
        recursion_desired: (flags & 0x0100) != 0,
        rcode: (flags & 0x000F) as u8,
        query,
    })
}

/// Reads a (possibly compressed) domain name starting at `offset`.
fn parse_name(payload: &[u8], mut offset: usize) -> Option<String> {
    let mut name = String::new();
    let mut jumps = 0;

    loop {
        let len = *payload.get(offset)? as usize;

        if len == 0 {
            break;
        }

        // Compression pointer
        if len & 0xC0 == 0xC0 {
            let low = *payload.get(offset + 1)? as usize;
            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return None;
            }
            offset = ((len & 0x3F) << 8) | low;
            continue;
        }

        offset += 1;
        if offset + len > payload.len() {
            return None;
        }
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(&String::from_utf8_lossy(&payload[offset..offset + len]));
        offset += len;
    }

    Some(name)
}
