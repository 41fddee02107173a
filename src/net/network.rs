//! 网络引擎
//!
//! 由拓扑、地址表、队列配置与路由表组装出的运行期网络：负责发包、逐跳转发、
//! 排队/串行化/传播时延，以及丢包与交付的计数。

use std::collections::HashMap;
use std::net::Ipv4Addr;

use super::channel::Channel;
use super::channel_ready::ChannelReady;
use super::deliver_packet::DeliverPacket;
use super::id::{ChannelId, NodeId};
use super::packet::{Datagram, Packet};
use super::routing::RoutingTable;
use super::stats::{DropReason, Stats};
use crate::sim::Simulator;
use crate::stats::FlowMonitor;
use crate::topo::{AddressPlan, QueuePlan, Topology};
use crate::trace::{AsciiTrace, TraceOp};
use tracing::{debug, trace};

/// 运行期网络
#[derive(Debug)]
pub struct Network {
    node_names: Vec<String>,
    link_names: Vec<String>,
    channels: Vec<Channel>,
    out: HashMap<(NodeId, NodeId), ChannelId>,
    routes: RoutingTable,
    owners: HashMap<Ipv4Addr, NodeId>,
    next_pkt_id: u64,
    pub stats: Stats,
    pub monitor: Option<FlowMonitor>,
    pub trace: Option<AsciiTrace>,
}

impl Network {
    /// 组装网络。每条链路生成 a->b、b->a 两个信道，队列按 `queues` 实例化。
    pub fn new(
        topo: &Topology,
        addrs: &AddressPlan,
        queues: &QueuePlan,
        routes: RoutingTable,
    ) -> Self {
        let mut channels = Vec::with_capacity(topo.links().len() * 2);
        let mut out = HashMap::new();

        for link in topo.links() {
            let spec = queues.spec(link.id);
            let subnet = addrs.subnet(link.id);
            for (id, from, to, from_addr) in [
                (ChannelId::forward(link.id), link.a, link.b, subnet.a_addr()),
                (ChannelId::reverse(link.id), link.b, link.a, subnet.b_addr()),
            ] {
                out.insert((from, to), id);
                channels.push(Channel {
                    id,
                    link: link.id,
                    from,
                    to,
                    from_addr,
                    rate: link.rate,
                    delay: link.delay,
                    busy: false,
                    queue: spec.build(id.0 as u64 + 1),
                });
            }
        }

        Self {
            node_names: topo.nodes().iter().map(|n| n.name.clone()).collect(),
            link_names: topo.links().iter().map(|l| l.name.clone()).collect(),
            channels,
            out,
            routes,
            owners: addrs.owners().collect(),
            next_pkt_id: 0,
            stats: Stats::default(),
            monitor: None,
            trace: None,
        }
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        self.node_names.get(id.0).map(String::as_str).unwrap_or("?")
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.0]
    }

    /// 地址 -> 归属节点
    pub fn resolve(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.owners.get(&addr).copied()
    }

    /// `from` 发往 `dst` 时使用的源地址：出口信道上的接口地址。
    pub fn source_address(&self, from: NodeId, dst: Ipv4Addr) -> Option<Ipv4Addr> {
        let dst_node = self.resolve(dst)?;
        if dst_node == from {
            return Some(dst);
        }
        let next = self.routes.next_hop(from, dst_node)?;
        let ch = self.out.get(&(from, next))?;
        Some(self.channels[ch.0].from_addr)
    }

    /// 应用层发包入口：填 id/发送时间，计入统计后交给转发。
    #[tracing::instrument(skip(self, dgram, sim), fields(from = %self.node_name(from), dst = %dgram.dst, dst_port = dgram.dst_port))]
    pub fn send(&mut self, from: NodeId, dgram: Datagram, sim: &mut Simulator) {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        let pkt = Packet {
            id,
            src: dgram.src,
            dst: dgram.dst,
            src_port: dgram.src_port,
            dst_port: dgram.dst_port,
            payload_bytes: dgram.payload_bytes,
            payload: dgram.payload,
            sent_at: sim.now(),
            hops_taken: 0,
        };
        trace!(pkt_id = id, "应用发包");

        self.stats.sent_pkts += 1;
        if let Some(m) = self.monitor.as_mut() {
            m.on_send(from, &pkt, sim.now());
        }

        match self.resolve(pkt.dst) {
            Some(dst) if dst == from => {
                sim.schedule(sim.now(), DeliverPacket { to: from, via: None, pkt });
            }
            Some(_) => self.forward_from(from, pkt, sim),
            None => self.drop_packet(from, pkt, DropReason::NoRoute, sim),
        }
    }

    /// 从指定节点转发数据包：查路由，入出口信道队列，空闲则立即开始发送。
    pub fn forward_from(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        let next = self
            .resolve(pkt.dst)
            .and_then(|dst| self.routes.next_hop(from, dst));
        let Some(ch_id) = next.and_then(|to| self.out.get(&(from, to)).copied()) else {
            debug!(from = %self.node_name(from), dst = %pkt.dst, "没有到目的地址的路由");
            self.drop_packet(from, pkt, DropReason::NoRoute, sim);
            return;
        };

        self.trace_event(TraceOp::Enqueue, ch_id, &pkt, sim);
        let ch = &mut self.channels[ch_id.0];
        match ch.queue.enqueue(pkt) {
            Ok(()) => {
                if !ch.busy {
                    self.start_tx(ch_id, sim);
                }
            }
            Err(dropped) => {
                trace!(channel = ch_id.0, reason = ?dropped.reason, "队列丢包");
                self.trace_event(TraceOp::Drop, ch_id, &dropped.pkt, sim);
                self.drop_packet(from, dropped.pkt, dropped.reason, sim);
            }
        }
    }

    /// 取队首开始串行化：出发时刻调度 `ChannelReady`，到达时刻调度 `DeliverPacket`。
    fn start_tx(&mut self, ch_id: ChannelId, sim: &mut Simulator) {
        let now = sim.now();
        let ch = &mut self.channels[ch_id.0];
        let Some(pkt) = ch.queue.dequeue() else {
            return;
        };
        ch.busy = true;
        let depart = now.saturating_add(ch.rate.tx_time(pkt.wire_bytes()));
        let arrive = depart.saturating_add(ch.delay);
        let to = ch.to;
        trace!(channel = ch_id.0, %depart, %arrive, "开始发送");

        self.trace_event(TraceOp::Dequeue, ch_id, &pkt, sim);
        sim.schedule(depart, ChannelReady { channel: ch_id });
        sim.schedule(
            arrive,
            DeliverPacket {
                to,
                via: Some(ch_id),
                pkt: pkt.advance(),
            },
        );
    }

    /// 信道完成一次串行化
    pub(crate) fn on_channel_ready(&mut self, ch_id: ChannelId, sim: &mut Simulator) {
        let ch = &mut self.channels[ch_id.0];
        ch.busy = false;
        if !ch.queue.is_empty() {
            self.start_tx(ch_id, sim);
        }
    }

    /// 数据包到达节点：目的地是本节点则交还给调用方（上层分发），否则继续转发。
    pub(crate) fn deliver(
        &mut self,
        to: NodeId,
        via: Option<ChannelId>,
        pkt: Packet,
        sim: &mut Simulator,
    ) -> Option<Packet> {
        if let Some(ch) = via {
            self.trace_event(TraceOp::Receive, ch, &pkt, sim);
        }
        if self.resolve(pkt.dst) == Some(to) {
            Some(pkt)
        } else {
            self.forward_from(to, pkt, sim);
            None
        }
    }

    /// 上层确认接收（有激活的接收端或回显应答）
    pub(crate) fn on_local_delivered(&mut self, at: NodeId, pkt: &Packet, sim: &Simulator) {
        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.payload_bytes as u64;
        if let Some(m) = self.monitor.as_mut() {
            m.on_receive(at, pkt, sim.now());
        }
    }

    /// 丢包：计数并通知 monitor
    pub(crate) fn drop_packet(
        &mut self,
        at: NodeId,
        pkt: Packet,
        reason: DropReason,
        sim: &Simulator,
    ) {
        debug!(node = %self.node_name(at), pkt_id = pkt.id, ?reason, "丢包");
        self.stats.record_drop(reason);
        if let Some(m) = self.monitor.as_mut() {
            m.on_drop(at, &pkt, reason);
        }
    }

    fn trace_event(&mut self, op: TraceOp, ch_id: ChannelId, pkt: &Packet, sim: &Simulator) {
        let Some(tr) = self.trace.as_mut() else {
            return;
        };
        let ch = &self.channels[ch_id.0];
        tr.record(
            op,
            sim.now(),
            &self.link_names[ch.link.0],
            &self.node_names[ch.from.0],
            &self.node_names[ch.to.0],
            pkt,
        );
    }
}
