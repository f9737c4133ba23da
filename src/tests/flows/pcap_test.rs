#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use pcap::Linktype;

    use crate::{
        flows::{bi_flow::BiFlow, conn_state::ConnState},
        pcap::{extract_packet_features, read_pcap_file, FlowTimeouts},
        tests::fixtures::{sample_capture, tcp_frame, udp_frame, SYN},
    };

    fn timeouts() -> FlowTimeouts {
        FlowTimeouts {
            active_timeout: 1800,
            idle_timeout: 120,
            expiration_check_interval: 60,
        }
    }

    #[test]
    fn test_ethernet_ipv4_udp_frame() {
        let frame = udp_frame(([10, 0, 0, 1], 1234), ([10, 0, 0, 2], 53), &[0u8; 4]);
        let packet = extract_packet_features(Linktype::ETHERNET, &frame, 7).unwrap();

        assert_eq!(packet.source_ip.to_string(), "10.0.0.1");
        assert_eq!(packet.destination_port, 53);
        assert_eq!(packet.protocol, 17);
        assert_eq!(packet.length, 32);
        assert_eq!(packet.data_length, 4);
        assert_eq!(packet.timestamp_us, 7);
        assert!(packet.dns.is_none());
    }

    #[test]
    fn test_vlan_tagged_frame() {
        let plain = tcp_frame(([10, 0, 0, 1], 40000), ([10, 0, 0, 2], 80), SYN, 1, 0, &[]);
        let mut tagged = plain[..12].to_vec();
        tagged.extend_from_slice(&[0x81, 0x00, 0x00, 0x0A]);
        tagged.extend_from_slice(&plain[12..]);

        let packet = extract_packet_features(Linktype::ETHERNET, &tagged, 0).unwrap();
        assert_eq!(packet.destination_port, 80);
        assert_eq!(packet.syn_flag, 1);
        assert_eq!(packet.sequence_number, 1);
    }

    #[test]
    fn test_linux_cooked_frame() {
        let plain = udp_frame(([10, 0, 0, 1], 1234), ([10, 0, 0, 2], 4321), &[]);
        let mut cooked = vec![0u8; 14];
        cooked.extend_from_slice(&[0x08, 0x00]);
        cooked.extend_from_slice(&plain[14..]);

        let packet = extract_packet_features(Linktype::LINUX_SLL, &cooked, 0).unwrap();
        assert_eq!(packet.source_port, 1234);
        assert_eq!(packet.destination_port, 4321);
    }

    #[test]
    fn test_truncated_frames_are_ignored() {
        assert!(extract_packet_features(Linktype::ETHERNET, &[0u8; 10], 0).is_none());
        assert!(extract_packet_features(Linktype::LINUX_SLL, &[0u8; 15], 0).is_none());
    }

    #[test]
    fn test_read_pcap_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.pcap");
        sample_capture(&path);

        let (sender, receiver) = mpsc::channel::<BiFlow>();
        let stats = read_pcap_file(&path, sender, timeouts()).unwrap();
        assert_eq!(stats.packets, 3);
        assert_eq!(stats.parsed, 3);

        let flows: Vec<BiFlow> = receiver.iter().collect();
        assert_eq!(flows.len(), 2);

        let dns = flows[0].to_record();
        assert_eq!(dns.dst_port, 53);
        assert_eq!(dns.src2dst_packets, 1);
        assert_eq!(dns.dst2src_packets, 1);
        assert_eq!(dns.dns_query.as_deref(), Some("example.com"));
        assert_eq!(dns.dns_rd, Some(true));
        assert_eq!(dns.dns_rejected, Some(false));
        assert_eq!(dns.service.as_deref(), Some("dns"));
        assert_eq!(dns.conn_state, Some(ConnState::SF));
        assert_eq!(dns.first_seen_ms, 1_600_000_000_000.0);

        let syn = flows[1].to_record();
        assert_eq!(syn.dst_port, 80);
        assert_eq!(syn.conn_state, Some(ConnState::S0));
        assert_eq!(syn.service.as_deref(), Some("http"));
        assert_eq!(syn.src2dst_bytes, 40);
    }

    #[test]
    fn test_missing_capture_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (sender, _receiver) = mpsc::channel::<BiFlow>();
        assert!(read_pcap_file(&dir.path().join("absent.pcap"), sender, timeouts()).is_err());
    }
}
