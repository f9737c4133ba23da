#[cfg(test)]
mod tests {
    use crate::{
        flows::{
            bi_flow::{BiFlow, TcpTeardown},
            conn_state::ConnState,
            flow::Flow,
            util::FlowExpireCause,
        },
        tests::fixtures::{ip, tcp_packet, udp_packet, ACK, FIN, RST, SYN},
    };

    fn new_tcp_flow() -> BiFlow {
        BiFlow::new(
            "192.168.1.1:8080-192.168.1.2:80-6".to_string(),
            ip(192, 168, 1, 1),
            8080,
            ip(192, 168, 1, 2),
            80,
            6,
            1_000_000,
        )
    }

    fn client() -> (std::net::IpAddr, u16) {
        (ip(192, 168, 1, 1), 8080)
    }

    fn server() -> (std::net::IpAddr, u16) {
        (ip(192, 168, 1, 2), 80)
    }

    #[test]
    fn test_bi_flow_creation() {
        let flow = new_tcp_flow();

        assert_eq!(flow.flow_key, "192.168.1.1:8080-192.168.1.2:80-6");
        assert_eq!(flow.ip_source, ip(192, 168, 1, 1));
        assert_eq!(flow.port_source, 8080);
        assert_eq!(flow.ip_destination, ip(192, 168, 1, 2));
        assert_eq!(flow.port_destination, 80);
        assert_eq!(flow.protocol, 6);
        assert_eq!(flow.fwd_packets, 0);
        assert_eq!(flow.bwd_packets, 0);
        assert_eq!(flow.state_fwd, TcpTeardown::Established);
        assert_eq!(flow.state_bwd, TcpTeardown::Established);
    }

    #[test]
    fn test_bi_flow_counts_both_directions() {
        let mut flow = new_tcp_flow();

        assert!(!flow.update_flow(&tcp_packet(client(), server(), SYN, 1_000_000, 60), true));
        assert!(!flow.update_flow(
            &tcp_packet(server(), client(), SYN | ACK, 1_000_500, 60),
            false
        ));
        assert!(!flow.update_flow(&tcp_packet(client(), server(), ACK, 1_001_000, 52), true));

        assert_eq!(flow.fwd_packets, 2);
        assert_eq!(flow.bwd_packets, 1);
        assert_eq!(flow.fwd_bytes, 112);
        assert_eq!(flow.bwd_bytes, 60);
        assert_eq!(flow.last_timestamp_us, 1_001_000);
        assert_eq!(flow.first_timestamp_us, 1_000_000);
    }

    #[test]
    fn test_bi_flow_fin_handshake_terminates() {
        let mut flow = new_tcp_flow();
        flow.update_flow(&tcp_packet(client(), server(), SYN, 1_000_000, 60), true);
        flow.update_flow(&tcp_packet(server(), client(), SYN | ACK, 1_000_100, 60), false);

        let mut fin_fwd = tcp_packet(client(), server(), FIN | ACK, 1_000_200, 52);
        fin_fwd.sequence_number = 1000;
        assert!(!flow.update_flow(&fin_fwd, true));
        assert_eq!(flow.state_fwd, TcpTeardown::FinSent);

        let mut fin_bwd = tcp_packet(server(), client(), FIN | ACK, 1_000_300, 52);
        fin_bwd.sequence_number = 5000;
        fin_bwd.sequence_number_ack = 1001;
        assert!(!flow.update_flow(&fin_bwd, false));
        assert_eq!(flow.state_fwd, TcpTeardown::FinAcked);

        let mut last_ack = tcp_packet(client(), server(), ACK, 1_000_400, 52);
        last_ack.sequence_number_ack = 5001;
        assert!(flow.update_flow(&last_ack, true));
        assert_eq!(flow.flow_expire_cause, Some(FlowExpireCause::TcpTermination));
        assert_eq!(flow.to_record().conn_state, Some(ConnState::SF));
    }

    #[test]
    fn test_bi_flow_rst_terminates() {
        let mut flow = new_tcp_flow();
        flow.update_flow(&tcp_packet(client(), server(), SYN, 1_000_000, 60), true);

        assert!(flow.update_flow(&tcp_packet(server(), client(), RST | ACK, 1_000_100, 40), false));
        assert_eq!(flow.flow_expire_cause, Some(FlowExpireCause::TcpReset));
        assert_eq!(flow.to_record().conn_state, Some(ConnState::REJ));
    }

    #[test]
    fn test_bi_flow_expiry() {
        let flow = new_tcp_flow();

        assert!(!flow.is_expired(1_000_000 + 60_000_000, 1800, 120).0);
        assert_eq!(
            flow.is_expired(1_000_000 + 121_000_000, 1800, 120),
            (true, FlowExpireCause::IdleTimeout)
        );
        assert_eq!(
            flow.is_expired(1_000_000 + 1801_000_000, 1800, 3600),
            (true, FlowExpireCause::ActiveTimeout)
        );
    }

    #[test]
    fn test_bi_flow_record_defaults_to_port_service() {
        let mut flow = BiFlow::new(
            "10.0.0.1:5000-10.0.0.2:1883-17".to_string(),
            ip(10, 0, 0, 1),
            5000,
            ip(10, 0, 0, 2),
            1883,
            17,
            0,
        );
        flow.update_flow(
            &udp_packet((ip(10, 0, 0, 1), 5000), (ip(10, 0, 0, 2), 1883), 0, 100),
            true,
        );

        let record = flow.to_record();
        assert_eq!(record.service.as_deref(), Some("mqtt"));
        assert_eq!(record.conn_state, Some(ConnState::S0));
        assert_eq!(record.src2dst_bytes, 100);
        assert_eq!(record.dst2src_packets, 0);
        assert_eq!(record.dns_query, None);
        assert_eq!(record.http_status, None);
    }
}
