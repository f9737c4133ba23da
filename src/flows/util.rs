use std::collections::HashMap;

use lazy_static::lazy_static;

/// Why a flow left the flow table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowExpireCause {
    ActiveTimeout,
    IdleTimeout,
    TcpTermination,
    TcpReset,
    ExporterShutdown,
}

lazy_static! {
    /// Well-known ports and the Zeek service name usually found on them.
    static ref WELL_KNOWN_SERVICES: HashMap<u16, &'static str> = {
        let mut services = HashMap::new();
        services.insert(20, "ftp-data");
        services.insert(21, "ftp");
        services.insert(22, "ssh");
        services.insert(23, "telnet");
        services.insert(25, "smtp");
        services.insert(53, "dns");
        services.insert(67, "dhcp");
        services.insert(68, "dhcp");
        services.insert(80, "http");
        services.insert(110, "pop3");
        services.insert(123, "ntp");
        services.insert(137, "netbios");
        services.insert(143, "imap");
        services.insert(161, "snmp");
        services.insert(443, "ssl");
        services.insert(445, "smb");
        services.insert(1883, "mqtt");
        services.insert(3306, "mysql");
        services.insert(3389, "rdp");
        services.insert(5353, "dns");
        services.insert(8080, "http");
        services.insert(8883, "ssl");
        services
    };
}

/// Service name for a flow from its ports, responder port first.
pub fn port_service(port_source: u16, port_destination: u16) -> Option<&'static str> {
    WELL_KNOWN_SERVICES
        .get(&port_destination)
        .or_else(|| WELL_KNOWN_SERVICES.get(&port_source))
        .copied()
}
