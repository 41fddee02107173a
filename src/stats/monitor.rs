//! 按流统计（FlowMonitor）
//!
//! 装在节点上，被动观察经过网络层的 TCP/UDP 包：按五元组归类，
//! 流 id 从 1 开始按首次出现的顺序分配。源节点记发送，目的节点上被
//! 应用接收才记接收，任何节点上的丢包都记到对应流的丢包原因里。

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::trace;

use crate::net::{DropReason, IpProtocol, NodeId, Packet};
use crate::sim::SimTime;
use crate::topo::Topology;

pub type FlowId = u32;

/// 五元组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FiveTuple {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub protocol: IpProtocol,
    pub src_port: u16,
    pub dst_port: u16,
}

impl FiveTuple {
    /// 只有 TCP/UDP 包参与归类
    pub fn of(pkt: &Packet) -> Option<Self> {
        match pkt.protocol() {
            IpProtocol::Tcp | IpProtocol::Udp => Some(Self {
                src: pkt.src,
                dst: pkt.dst,
                protocol: pkt.protocol(),
                src_port: pkt.src_port,
                dst_port: pkt.dst_port,
            }),
            IpProtocol::Icmp => None,
        }
    }
}

/// 单条流的原始计数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowStats {
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub drops: BTreeMap<DropReason, u64>,
    pub delay_sum: SimTime,
    pub jitter_sum: SimTime,
    pub first_tx: Option<SimTime>,
    pub last_tx: Option<SimTime>,
    pub first_rx: Option<SimTime>,
    pub last_rx: Option<SimTime>,
    last_delay: Option<SimTime>,
}

impl FlowStats {
    /// 发出但没被接收的包（含运行结束时仍在途的）
    pub fn lost_packets(&self) -> u64 {
        self.tx_packets.saturating_sub(self.rx_packets)
    }

    pub fn mean_delay(&self) -> Option<SimTime> {
        (self.rx_packets > 0).then(|| SimTime(self.delay_sum.0 / self.rx_packets))
    }

    pub fn mean_jitter(&self) -> Option<SimTime> {
        (self.rx_packets > 1).then(|| SimTime(self.jitter_sum.0 / (self.rx_packets - 1)))
    }

    /// 接收吞吐（bit/s），按首末接收时刻计
    pub fn rx_throughput_bps(&self) -> Option<f64> {
        let span = self.last_rx?.saturating_sub(self.first_rx?);
        (span > SimTime::ZERO).then(|| self.rx_bytes as f64 * 8.0 / span.as_secs_f64())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowMonitor {
    installed: Vec<bool>,
    classifier: HashMap<FiveTuple, FlowId>,
    flows: Vec<(FiveTuple, FlowStats)>,
}

impl FlowMonitor {
    /// 不装在任何节点上的空 monitor
    pub fn new(node_count: usize) -> Self {
        Self {
            installed: vec![false; node_count],
            ..Self::default()
        }
    }

    /// 装在所有节点上
    pub fn install_all(topo: &Topology) -> Self {
        let mut m = Self::new(topo.nodes().len());
        for n in topo.nodes() {
            m.install(n.id);
        }
        m
    }

    pub fn install(&mut self, node: NodeId) {
        if let Some(slot) = self.installed.get_mut(node.0) {
            *slot = true;
        }
    }

    pub fn is_installed(&self, node: NodeId) -> bool {
        self.installed.get(node.0).copied().unwrap_or(false)
    }

    fn classify(&mut self, pkt: &Packet) -> Option<&mut FlowStats> {
        let tuple = FiveTuple::of(pkt)?;
        let id = match self.classifier.get(&tuple) {
            Some(&id) => id,
            None => {
                self.flows.push((tuple, FlowStats::default()));
                let id = self.flows.len() as FlowId;
                self.classifier.insert(tuple, id);
                trace!(flow_id = id, ?tuple, "新流");
                id
            }
        };
        self.flows.get_mut(id as usize - 1).map(|(_, s)| s)
    }

    pub(crate) fn on_send(&mut self, node: NodeId, pkt: &Packet, now: SimTime) {
        if !self.is_installed(node) {
            return;
        }
        let Some(s) = self.classify(pkt) else {
            return;
        };
        s.tx_packets += 1;
        s.tx_bytes += pkt.ip_bytes() as u64;
        s.first_tx.get_or_insert(now);
        s.last_tx = Some(now);
    }

    pub(crate) fn on_receive(&mut self, node: NodeId, pkt: &Packet, now: SimTime) {
        if !self.is_installed(node) {
            return;
        }
        let Some(s) = self.classify(pkt) else {
            return;
        };
        let delay = now.saturating_sub(pkt.sent_at);
        s.rx_packets += 1;
        s.rx_bytes += pkt.ip_bytes() as u64;
        s.delay_sum = s.delay_sum.saturating_add(delay);
        if let Some(prev) = s.last_delay {
            s.jitter_sum = s.jitter_sum.saturating_add(SimTime(prev.0.abs_diff(delay.0)));
        }
        s.last_delay = Some(delay);
        s.first_rx.get_or_insert(now);
        s.last_rx = Some(now);
    }

    pub(crate) fn on_drop(&mut self, node: NodeId, pkt: &Packet, reason: DropReason) {
        if !self.is_installed(node) {
            return;
        }
        if let Some(s) = self.classify(pkt) {
            *s.drops.entry(reason).or_default() += 1;
        }
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// (流 id, 五元组, 计数)，按流 id 升序
    pub fn flows(&self) -> impl Iterator<Item = (FlowId, &FiveTuple, &FlowStats)> + '_ {
        self.flows
            .iter()
            .enumerate()
            .map(|(i, (t, s))| (i as FlowId + 1, t, s))
    }

    pub fn lookup(&self, tuple: &FiveTuple) -> Option<&FlowStats> {
        let id = *self.classifier.get(tuple)?;
        self.flows.get(id as usize - 1).map(|(_, s)| s)
    }
}
