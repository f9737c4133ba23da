#[cfg(test)]
mod tests {
    use crate::{
        flows::conn_state::{ConnHistory, ConnState},
        tests::fixtures::{ip, tcp_packet, udp_packet, ACK, FIN, RST, SYN, TCP, UDP},
    };

    fn replay(protocol: u8, packets: &[(bool, u8)]) -> ConnState {
        let orig = (ip(10, 0, 0, 1), 40000);
        let resp = (ip(10, 0, 0, 2), 80);
        let mut history = ConnHistory::new(protocol);
        for (i, (forward, flags)) in packets.iter().enumerate() {
            let (src, dst) = if *forward { (orig, resp) } else { (resp, orig) };
            let packet = if protocol == TCP {
                tcp_packet(src, dst, *flags, i as i64, 60)
            } else {
                udp_packet(src, dst, i as i64, 60)
            };
            history.update(&packet, *forward);
        }
        history.state()
    }

    #[test]
    fn test_tcp_states() {
        assert_eq!(replay(TCP, &[(true, SYN)]), ConnState::S0);
        assert_eq!(replay(TCP, &[(true, SYN), (false, RST | ACK)]), ConnState::REJ);
        assert_eq!(
            replay(TCP, &[(true, SYN), (false, SYN | ACK), (true, ACK)]),
            ConnState::S1
        );
        assert_eq!(
            replay(
                TCP,
                &[
                    (true, SYN),
                    (false, SYN | ACK),
                    (true, FIN | ACK),
                    (false, FIN | ACK)
                ]
            ),
            ConnState::SF
        );
        assert_eq!(
            replay(TCP, &[(true, SYN), (false, SYN | ACK), (true, RST)]),
            ConnState::RSTO
        );
        assert_eq!(
            replay(TCP, &[(true, SYN), (false, SYN | ACK), (false, RST)]),
            ConnState::RSTR
        );
        assert_eq!(replay(TCP, &[(true, ACK), (false, ACK)]), ConnState::OTH);
    }

    #[test]
    fn test_non_tcp_states() {
        assert_eq!(replay(UDP, &[(true, 0)]), ConnState::S0);
        assert_eq!(replay(UDP, &[(true, 0), (false, 0)]), ConnState::SF);
        assert_eq!(replay(UDP, &[]), ConnState::OTH);
    }

    #[test]
    fn test_conn_state_text() {
        assert_eq!(ConnState::RSTO.to_string(), "RSTO");
        assert_eq!("REJ".parse::<ConnState>().unwrap(), ConnState::REJ);
    }
}
