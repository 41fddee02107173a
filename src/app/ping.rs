//! ICMP echo
//!
//! 每个节点都会应答 echo request；`Pinger` 按固定间隔发 request，
//! 用自己记下的发送时刻算 RTT。

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::info;

use crate::net::{Datagram, Network, NodeId, Payload, WanWorld};
use crate::scenario::ResolvedPing;
use crate::sim::{Event, SimTime, Simulator, World};

#[derive(Debug, Clone)]
pub struct Pinger {
    pub ping: usize,
    pub label: String,
    pub node: NodeId,
    pub dst_addr: Ipv4Addr,
    pub interval: SimTime,
    pub size_bytes: u32,
    pub stop: SimTime,
    pub verbose: bool,
    src_addr: Ipv4Addr,
    active: bool,
    epoch: u64,
    next_seq: u64,
    outstanding: BTreeMap<u64, SimTime>,
    rtts: Vec<SimTime>,
}

impl Pinger {
    pub(crate) fn new(p: &ResolvedPing) -> Self {
        Self {
            ping: p.index,
            label: p.spec.label(),
            node: p.src,
            dst_addr: p.dst_addr,
            interval: p.spec.interval,
            size_bytes: p.spec.size_bytes,
            stop: p.spec.stop,
            verbose: p.spec.verbose,
            src_addr: Ipv4Addr::UNSPECIFIED,
            active: false,
            epoch: 0,
            next_seq: 0,
            outstanding: BTreeMap::new(),
            rtts: Vec::new(),
        }
    }

    /// echo 标识：ping 在场景里的下标
    pub fn ident(&self) -> u16 {
        self.ping as u16
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rtts(&self) -> &[SimTime] {
        &self.rtts
    }

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
        let seq = self.next_seq;
        self.next_seq += 1;
        self.outstanding.insert(seq, now);
        net.send(
            self.node,
            Datagram {
                src: self.src_addr,
                dst: self.dst_addr,
                src_port: 0,
                dst_port: 0,
                payload_bytes: self.size_bytes,
                payload: Payload::EchoRequest {
                    ident: self.ident(),
                    seq,
                },
            },
            sim,
        );

        let next = now.saturating_add(self.interval);
        if next < self.stop {
            sim.schedule(
                next,
                PingTick {
                    ping: self.ping,
                    epoch: self.epoch,
                },
            );
        }
    }

    /// 收到 reply。停用之后到达的 reply 也照样计入：RTT 只和发出时刻有关。
    pub(crate) fn on_reply(&mut self, seq: u64, bytes: u32, now: SimTime) -> bool {
        let Some(sent) = self.outstanding.remove(&seq) else {
            return false;
        };
        let rtt = now.saturating_sub(sent);
        self.rtts.push(rtt);
        if self.verbose {
            info!(
                "{} bytes from {}: icmp_seq={} time={:.3} ms",
                bytes,
                self.dst_addr,
                seq,
                rtt.as_secs_f64() * 1e3
            );
        }
        true
    }

    pub fn report(&self) -> PingReport {
        let ms = |t: SimTime| t.as_secs_f64() * 1e3;
        let received = self.rtts.len() as u64;
        let avg = (received > 0).then(|| {
            self.rtts.iter().map(|t| ms(*t)).sum::<f64>() / received as f64
        });
        PingReport {
            ping: self.ping,
            label: self.label.clone(),
            dst_addr: self.dst_addr,
            transmitted: self.next_seq,
            received,
            lost: self.next_seq - received,
            rtt_min_ms: self.rtts.iter().min().map(|t| ms(*t)),
            rtt_avg_ms: avg,
            rtt_max_ms: self.rtts.iter().max().map(|t| ms(*t)),
        }
    }
}

/// ping 汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingReport {
    pub ping: usize,
    pub label: String,
    pub dst_addr: Ipv4Addr,
    pub transmitted: u64,
    pub received: u64,
    pub lost: u64,
    pub rtt_min_ms: Option<f64>,
    pub rtt_avg_ms: Option<f64>,
    pub rtt_max_ms: Option<f64>,
}

/// ping 定时器
#[derive(Debug)]
pub struct PingTick {
    pub ping: usize,
    pub epoch: u64,
}

impl Event for PingTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = WanWorld::from_dyn(world);
        w.apps.on_ping_tick(self.ping, self.epoch, sim, &mut w.net);
    }
}
