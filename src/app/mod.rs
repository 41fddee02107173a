//! 应用层
//!
//! 场景里的每条流对应一对应用：源节点上的恒定速率发送端，目的节点上
//! 绑定 (协议, 端口) 的接收端。接收端只在激活期间收包，没有激活接收端的
//! 端口上到达的包按 `no_listener` 丢弃。每个节点都应答 ICMP echo。

mod onoff;
mod orchestrator;
mod ping;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::net::{Datagram, DropReason, IpProtocol, Network, NodeId, Packet, Payload};
use crate::scenario::{Protocol, ValidatedScenario};
use crate::sim::{SimTime, Simulator};

pub use onoff::{OnOffSender, SendTick, SenderReport};
pub use orchestrator::{FlowOrchestrator, StartApp, StopApp};
pub use ping::{PingReport, PingTick, Pinger};

/// 节点上第一个临时端口
pub const EPHEMERAL_PORT_BASE: u16 = 49153;

/// 应用引用：场景中的第几条流 / 第几个 ping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum AppRef {
    Flow(usize),
    Ping(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppAction {
    Activated,
    Deactivated,
}

/// 激活/停用记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Activation {
    #[serde(with = "crate::sim::secs")]
    pub at: SimTime,
    pub app: AppRef,
    pub action: AppAction,
}

/// 接收端计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
    pub rx_pkts: u64,
    pub rx_bytes: u64,
    pub acks_sent: u64,
}

#[derive(Debug, Clone)]
struct PacketSink {
    node: NodeId,
    protocol: IpProtocol,
    port: u16,
    stats: SinkStats,
}

/// 已安装的全部应用
#[derive(Debug, Default)]
pub struct Apps {
    senders: Vec<OnOffSender>,
    sinks: Vec<PacketSink>,
    /// 激活中的接收端 -> 流下标
    listeners: HashMap<(NodeId, IpProtocol, u16), usize>,
    /// 激活中的 TCP 发送端 (节点, 源端口) -> 流下标，用于接收 ACK
    tcp_clients: HashMap<(NodeId, u16), usize>,
    pingers: Vec<Pinger>,
    ephemeral: HashMap<NodeId, u16>,
    log: Vec<Activation>,
}

impl Apps {
    /// 为场景装好所有应用（都处于未激活状态）。源端口按声明顺序分配。
    pub(crate) fn install(&mut self, scenario: &ValidatedScenario) {
        *self = Self::default();
        for flow in scenario.flows() {
            let port = self.next_ephemeral(flow.src);
            self.senders.push(OnOffSender::new(flow, port));
            self.sinks.push(PacketSink {
                node: flow.dst,
                protocol: flow.spec.protocol.ip_protocol(),
                port: flow.spec.port,
                stats: SinkStats::default(),
            });
        }
        self.pingers = scenario.pings().iter().map(Pinger::new).collect();
    }

    fn next_ephemeral(&mut self, node: NodeId) -> u16 {
        let next = self.ephemeral.entry(node).or_insert(EPHEMERAL_PORT_BASE);
        let port = *next;
        *next = next.wrapping_add(1).max(EPHEMERAL_PORT_BASE);
        port
    }

    pub fn senders(&self) -> &[OnOffSender] {
        &self.senders
    }

    pub fn pingers(&self) -> &[Pinger] {
        &self.pingers
    }

    pub fn sink_stats(&self, flow: usize) -> Option<&SinkStats> {
        self.sinks.get(flow).map(|s| &s.stats)
    }

    /// 激活/停用记录（按发生顺序）
    pub fn activations(&self) -> &[Activation] {
        &self.log
    }

    pub fn is_listening(&self, node: NodeId, protocol: IpProtocol, port: u16) -> bool {
        self.listeners.contains_key(&(node, protocol, port))
    }

    pub fn sender_reports(&self) -> Vec<SenderReport> {
        self.senders.iter().map(OnOffSender::report).collect()
    }

    pub fn ping_reports(&self) -> Vec<PingReport> {
        self.pingers.iter().map(Pinger::report).collect()
    }

    /// 激活：先起接收端，再起发送端（发送端激活即发第一个包）。
    pub(crate) fn start(&mut self, app: AppRef, sim: &mut Simulator, net: &mut Network) {
        match app {
            AppRef::Flow(i) => {
                let (Some(sink), Some(sender)) = (self.sinks.get(i), self.senders.get_mut(i))
                else {
                    return;
                };
                self.listeners.insert((sink.node, sink.protocol, sink.port), i);
                if sender.protocol == Protocol::Tcp {
                    self.tcp_clients.insert((sender.node, sender.src_port), i);
                }
                debug!(flow = i, label = %sender.label, "激活流");
                sender.start(sim, net);
            }
            AppRef::Ping(i) => {
                let Some(p) = self.pingers.get_mut(i) else {
                    return;
                };
                debug!(ping = i, label = %p.label, "激活 ping");
                p.start(sim, net);
            }
        }
        self.log.push(Activation {
            at: sim.now(),
            app,
            action: AppAction::Activated,
        });
    }

    /// 停用：只清理这一条流自己的状态，其余流不受影响。
    pub(crate) fn stop(&mut self, app: AppRef, sim: &Simulator) {
        match app {
            AppRef::Flow(i) => {
                let (Some(sink), Some(sender)) = (self.sinks.get(i), self.senders.get_mut(i))
                else {
                    return;
                };
                sender.stop();
                self.tcp_clients.remove(&(sender.node, sender.src_port));
                // 同一端口可能已交给下一个时间窗的流
                let key = (sink.node, sink.protocol, sink.port);
                if self.listeners.get(&key) == Some(&i) {
                    self.listeners.remove(&key);
                }
                debug!(flow = i, sent = sender.sent_pkts, "停用流");
            }
            AppRef::Ping(i) => {
                let Some(p) = self.pingers.get_mut(i) else {
                    return;
                };
                p.stop();
            }
        }
        self.log.push(Activation {
            at: sim.now(),
            app,
            action: AppAction::Deactivated,
        });
    }

    pub(crate) fn on_send_tick(
        &mut self,
        flow: usize,
        epoch: u64,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        if let Some(s) = self.senders.get_mut(flow) {
            s.tick(epoch, sim, net);
        }
    }

    pub(crate) fn on_ping_tick(
        &mut self,
        ping: usize,
        epoch: u64,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        if let Some(p) = self.pingers.get_mut(ping) {
            p.tick(epoch, sim, net);
        }
    }

    /// 目的节点上的分发
    pub(crate) fn on_local_delivery(
        &mut self,
        to: NodeId,
        pkt: Packet,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match pkt.payload {
            Payload::Udp | Payload::TcpData { .. } => {
                let Some(&i) = self.listeners.get(&(to, pkt.protocol(), pkt.dst_port)) else {
                    net.drop_packet(to, pkt, DropReason::NoListener, sim);
                    return;
                };
                let sink = &mut self.sinks[i];
                sink.stats.rx_pkts += 1;
                sink.stats.rx_bytes += pkt.payload_bytes as u64;
                net.on_local_delivered(to, &pkt, sim);
                if let Payload::TcpData { seq } = pkt.payload {
                    sink.stats.acks_sent += 1;
                    net.send(
                        to,
                        Datagram {
                            src: pkt.dst,
                            dst: pkt.src,
                            src_port: pkt.dst_port,
                            dst_port: pkt.src_port,
                            payload_bytes: 0,
                            payload: Payload::TcpAck {
                                ack: seq + pkt.payload_bytes as u64,
                            },
                        },
                        sim,
                    );
                }
            }
            Payload::TcpAck { ack } => {
                let Some(&i) = self.tcp_clients.get(&(to, pkt.dst_port)) else {
                    net.drop_packet(to, pkt, DropReason::NoListener, sim);
                    return;
                };
                let sender = &mut self.senders[i];
                sender.acked = sender.acked.max(ack);
                net.on_local_delivered(to, &pkt, sim);
            }
            Payload::EchoRequest { ident, seq } => {
                net.on_local_delivered(to, &pkt, sim);
                net.send(
                    to,
                    Datagram {
                        src: pkt.dst,
                        dst: pkt.src,
                        src_port: 0,
                        dst_port: 0,
                        payload_bytes: pkt.payload_bytes,
                        payload: Payload::EchoReply { ident, seq },
                    },
                    sim,
                );
            }
            Payload::EchoReply { ident, seq } => {
                let accepted = self
                    .pingers
                    .get_mut(ident as usize)
                    .filter(|p| p.node == to)
                    .is_some_and(|p| p.on_reply(seq, pkt.ip_bytes(), sim.now()));
                if accepted {
                    net.on_local_delivered(to, &pkt, sim);
                } else {
                    net.drop_packet(to, pkt, DropReason::NoListener, sim);
                }
            }
        }
    }
}
