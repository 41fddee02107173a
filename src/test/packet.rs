use std::net::Ipv4Addr;

use crate::net::{IpProtocol, Packet, Payload};
use crate::sim::SimTime;

fn pkt(payload_bytes: u32, payload: Payload) -> Packet {
    Packet {
        id: 1,
        src: Ipv4Addr::new(10, 0, 1, 1),
        dst: Ipv4Addr::new(10, 0, 1, 2),
        src_port: 49153,
        dst_port: 9,
        payload_bytes,
        payload,
        sent_at: SimTime::ZERO,
        hops_taken: 0,
    }
}

#[test]
fn wire_size_adds_ip_transport_and_framing_headers() {
    let udp = pkt(210, Payload::Udp);
    assert_eq!(udp.protocol(), IpProtocol::Udp);
    assert_eq!(udp.ip_bytes(), 238);
    assert_eq!(udp.wire_bytes(), 240);

    let data = pkt(512, Payload::TcpData { seq: 0 });
    assert_eq!(data.ip_bytes(), 552);

    let ack = pkt(0, Payload::TcpAck { ack: 512 });
    assert_eq!(ack.protocol(), IpProtocol::Tcp);
    assert_eq!(ack.ip_bytes(), 40);

    let echo = pkt(1024, Payload::EchoRequest { ident: 0, seq: 0 });
    assert_eq!(echo.protocol(), IpProtocol::Icmp);
    assert_eq!(echo.wire_bytes(), 1054);
}

#[test]
fn protocol_numbers_follow_iana() {
    assert_eq!(IpProtocol::Icmp.number(), 1);
    assert_eq!(IpProtocol::Tcp.number(), 6);
    assert_eq!(IpProtocol::Udp.number(), 17);
}

#[test]
fn advance_counts_hops() {
    let p = pkt(10, Payload::Udp).advance().advance();
    assert_eq!(p.hops_taken, 2);
}
