//! 恒定速率发送端（常开的 OnOff）
//!
//! 激活时立刻发第一个包，之后每隔 `packet_bytes * 8 / rate` 发一个，
//! 到 `stop` 为止（`stop` 时刻及之后不再发）。停用时 epoch 加一，
//! 已经调度出去的发送定时器因 epoch 不匹配而作废。

use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::trace;

use crate::net::{Datagram, Network, NodeId, Payload, WanWorld};
use crate::scenario::{Protocol, ResolvedFlow};
use crate::sim::{Event, SimTime, Simulator, World};

#[derive(Debug, Clone)]
pub struct OnOffSender {
    pub flow: usize,
    pub label: String,
    pub node: NodeId,
    pub protocol: Protocol,
    pub src_port: u16,
    pub dst_addr: Ipv4Addr,
    pub dst_port: u16,
    pub packet_bytes: u32,
    pub interval: SimTime,
    pub stop: SimTime,
    src_addr: Ipv4Addr,
    active: bool,
    epoch: u64,
    next_seq: u64,
    pub sent_pkts: u64,
    pub sent_bytes: u64,
    /// TCP：最高累计确认
    pub acked: u64,
}

impl OnOffSender {
    pub(crate) fn new(flow: &ResolvedFlow, src_port: u16) -> Self {
        Self {
            flow: flow.index,
            label: flow.spec.label(),
            node: flow.src,
            protocol: flow.spec.protocol,
            src_port,
            dst_addr: flow.dst_addr,
            dst_port: flow.spec.port,
            packet_bytes: flow.spec.packet_bytes,
            interval: flow.spec.interval(),
            stop: flow.spec.stop,
            src_addr: Ipv4Addr::UNSPECIFIED,
            active: false,
            epoch: 0,
            next_seq: 0,
            sent_pkts: 0,
            sent_bytes: 0,
            acked: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 激活并发出第一个包
    pub(crate) fn start(&mut self, sim: &mut Simulator, net: &mut Network) {
        if self.active {
            return;
        }
        self.active = true;
        self.epoch += 1;
        self.src_addr = net
            .source_address(self.node, self.dst_addr)
            .unwrap_or(Ipv4Addr::UNSPECIFIED);
        self.tick(self.epoch, sim, net);
    }

    pub(crate) fn stop(&mut self) {
        self.active = false;
        self.epoch += 1;
    }

    pub(crate) fn tick(&mut self, epoch: u64, sim: &mut Simulator, net: &mut Network) {
        let now = sim.now();
        if !self.active || epoch != self.epoch || now >= self.stop {
            return;
        }

        let payload = match self.protocol {
            Protocol::Udp => Payload::Udp,
            Protocol::Tcp => Payload::TcpData { seq: self.next_seq },
        };
        self.next_seq += self.packet_bytes as u64;
        self.sent_pkts += 1;
        self.sent_bytes += self.packet_bytes as u64;
        trace!(flow = self.flow, seq = self.sent_pkts, "发送端发包");
        net.send(
            self.node,
            Datagram {
                src: self.src_addr,
                dst: self.dst_addr,
                src_port: self.src_port,
                dst_port: self.dst_port,
                payload_bytes: self.packet_bytes,
                payload,
            },
            sim,
        );

        let next = now.saturating_add(self.interval);
        if next < self.stop {
            sim.schedule(
                next,
                SendTick {
                    flow: self.flow,
                    epoch: self.epoch,
                },
            );
        }
    }

    pub fn report(&self) -> SenderReport {
        SenderReport {
            flow: self.flow,
            label: self.label.clone(),
            src_port: self.src_port,
            sent_pkts: self.sent_pkts,
            sent_bytes: self.sent_bytes,
            acked_bytes: (self.protocol == Protocol::Tcp).then_some(self.acked),
        }
    }
}

/// 发送端汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderReport {
    pub flow: usize,
    pub label: String,
    pub src_port: u16,
    pub sent_pkts: u64,
    pub sent_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acked_bytes: Option<u64>,
}

/// 发送定时器
#[derive(Debug)]
pub struct SendTick {
    pub flow: usize,
    pub epoch: u64,
}

impl Event for SendTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = WanWorld::from_dyn(world);
        w.apps.on_send_tick(self.flow, self.epoch, sim, &mut w.net);
    }
}
