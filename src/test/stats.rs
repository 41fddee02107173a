use std::fs;
use std::net::Ipv4Addr;

use super::{unique_temp_dir, wan_fabric, wan_world};
use crate::app::FlowOrchestrator;
use crate::net::{DropReason, IpProtocol, NodeId, Packet, Payload};
use crate::scenario::{FlowSpec, PingSpec, Scenario, ValidatedScenario};
use crate::sim::{SimTime, Simulator};
use crate::stats::{FiveTuple, FlowMonitor, StatsCollector, StatsReport};

fn pkt(src_port: u16, payload: Payload, sent_at: SimTime) -> Packet {
    Packet {
        id: 0,
        src: Ipv4Addr::new(10, 1, 7, 1),
        dst: Ipv4Addr::new(10, 1, 9, 1),
        src_port,
        dst_port: 53,
        payload_bytes: 100,
        payload,
        sent_at,
        hops_taken: 0,
    }
}

#[test]
fn monitor_assigns_ids_in_first_seen_order() {
    let mut m = FlowMonitor::new(2);
    m.install(NodeId(0));
    m.install(NodeId(1));

    m.on_send(NodeId(0), &pkt(2000, Payload::Udp, SimTime::ZERO), SimTime::ZERO);
    m.on_send(NodeId(0), &pkt(1000, Payload::Udp, SimTime::ZERO), SimTime::ZERO);
    m.on_send(NodeId(0), &pkt(2000, Payload::Udp, SimTime(5)), SimTime(5));
    m.on_send(
        NodeId(0),
        &pkt(0, Payload::EchoRequest { ident: 0, seq: 0 }, SimTime::ZERO),
        SimTime::ZERO,
    );

    let ids: Vec<_> = m.flows().map(|(id, t, s)| (id, t.src_port, s.tx_packets)).collect();
    assert_eq!(ids, [(1, 2000, 2), (2, 1000, 1)]);
    assert_eq!(
        FiveTuple::of(&pkt(0, Payload::EchoReply { ident: 0, seq: 0 }, SimTime::ZERO)),
        None
    );
}

#[test]
fn monitor_accumulates_delay_jitter_and_drops() {
    let mut m = FlowMonitor::new(2);
    m.install(NodeId(0));
    m.install(NodeId(1));
    let data = |at: u64| pkt(49153, Payload::TcpData { seq: 0 }, SimTime(at));

    for at in [0, 100, 200, 300] {
        m.on_send(NodeId(0), &data(at), SimTime(at));
    }
    m.on_receive(NodeId(1), &data(0), SimTime(10));
    m.on_receive(NodeId(1), &data(100), SimTime(130));
    m.on_receive(NodeId(1), &data(200), SimTime(215));
    m.on_drop(NodeId(1), &data(300), DropReason::QueueFull);

    let tuple = FiveTuple::of(&data(0)).expect("tcp");
    assert_eq!(tuple.protocol, IpProtocol::Tcp);
    let s = m.lookup(&tuple).expect("flow");
    assert_eq!(s.tx_packets, 4);
    assert_eq!(s.tx_bytes, 4 * 140);
    assert_eq!(s.rx_packets, 3);
    assert_eq!(s.lost_packets(), 1);
    assert_eq!(s.delay_sum, SimTime(10 + 30 + 15));
    // |30 - 10| + |15 - 30|
    assert_eq!(s.jitter_sum, SimTime(35));
    assert_eq!(s.mean_delay(), Some(SimTime(18)));
    assert_eq!(s.mean_jitter(), Some(SimTime(17)));
    assert_eq!(s.drops.get(&DropReason::QueueFull), Some(&1));
    assert_eq!(s.first_rx, Some(SimTime(10)));
    assert_eq!(s.last_rx, Some(SimTime(215)));
    assert_eq!(s.last_tx, Some(SimTime(300)));
}

#[test]
fn monitor_ignores_nodes_it_is_not_installed_on() {
    let mut m = FlowMonitor::new(2);
    m.install(NodeId(0));
    assert!(m.is_installed(NodeId(0)));
    assert!(!m.is_installed(NodeId(1)));
    assert!(!m.is_installed(NodeId(7)));

    let p = pkt(1, Payload::Udp, SimTime::ZERO);
    m.on_receive(NodeId(1), &p, SimTime(3));
    m.on_drop(NodeId(1), &p, DropReason::NoRoute);
    assert_eq!(m.flow_count(), 0);
}

fn padrao_like() -> Scenario {
    Scenario::new("mini", "mini.flowmon", SimTime::from_secs(2))
        .flow(
            FlowSpec::udp("G1", "G2", 9)
                .via("G1_G2")
                .packet_bytes(210)
                .window(SimTime::ZERO, SimTime::from_secs(1)),
        )
        .ping(
            PingSpec::new("S4", "L1")
                .via("S1_L1")
                .window(SimTime::ZERO, SimTime::from_secs(1)),
        )
}

#[test]
fn collector_writes_a_json_report() {
    let fabric = wan_fabric();
    let v = ValidatedScenario::validate(&fabric.topo, &fabric.addrs, padrao_like()).expect("valid");
    let mut world = wan_world(&fabric);
    let mut sim = Simulator::default();
    let collector = StatsCollector::new(true);
    assert!(collector.is_enabled());
    collector.install(&fabric.topo, &mut world);
    FlowOrchestrator::schedule(&v, &mut world, &mut sim);
    collector.drive(v.horizon(), &mut sim, &mut world);
    assert_eq!(sim.now(), SimTime::from_secs(2));

    let report = collector.report(&v, &sim, &world).expect("report");
    assert_eq!(report.scenario, "mini");
    assert_eq!(report.events, sim.executed());
    assert_eq!(report.flows.len(), 1);
    let flow = &report.flows[0];
    assert_eq!(flow.flow_id, 1);
    assert_eq!(flow.src_addr, Ipv4Addr::new(10, 0, 1, 1));
    assert_eq!(flow.dst_addr, Ipv4Addr::new(10, 0, 1, 2));
    assert_eq!(flow.dst_port, 9);
    assert_eq!(flow.lost_packets, flow.tx_packets - flow.rx_packets);
    assert_eq!(report.senders.len(), 1);
    assert_eq!(report.pings[0].received, 1);
    assert_eq!(report.activations.len(), 4);

    let dir = unique_temp_dir("stats");
    let path = dir.join(v.output());
    collector.serialize(&report, &path).expect("write");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(json["scenario"], "mini");
    assert_eq!(json["horizon"], 2.0);
    assert_eq!(json["flows"][0]["protocol"], "udp");
    assert_eq!(json["flows"][0]["src_port"], 49153);
    assert_eq!(json["activations"][0]["app"]["kind"], "flow");
    assert_eq!(json["activations"][0]["action"], "activated");
    assert!(json["senders"][0].get("acked_bytes").is_none());
    assert_eq!(
        json["network"]["sent_pkts"],
        report.network.sent_pkts
    );
}

#[test]
fn disabled_collector_produces_no_report() {
    let fabric = wan_fabric();
    let v = ValidatedScenario::validate(&fabric.topo, &fabric.addrs, padrao_like()).expect("valid");
    let mut world = wan_world(&fabric);
    let mut sim = Simulator::default();
    let collector = StatsCollector::new(false);
    collector.install(&fabric.topo, &mut world);
    assert!(world.net.monitor.is_none());

    FlowOrchestrator::schedule(&v, &mut world, &mut sim);
    collector.drive(v.horizon(), &mut sim, &mut world);
    assert!(collector.report(&v, &sim, &world).is_none());
    // 网络层计数照常
    assert!(world.net.stats.delivered_pkts > 0);
}

#[test]
fn flow_records_mirror_monitor_counters() {
    let mut m = FlowMonitor::new(1);
    m.install(NodeId(0));
    let p = pkt(7, Payload::Udp, SimTime::ZERO);
    m.on_send(NodeId(0), &p, SimTime::ZERO);
    m.on_receive(NodeId(0), &p, SimTime::from_millis(4));

    let records = StatsReport::flow_records(&m);
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.tx_bytes, 128);
    assert_eq!(r.rx_packets, 1);
    assert_eq!(r.mean_delay_s, Some(0.004));
    assert_eq!(r.mean_jitter_s, None);
    assert_eq!(r.rx_throughput_bps, None);
    assert_eq!(r.time_first_tx_s, Some(0.0));
}
