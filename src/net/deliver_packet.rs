//! 数据包到达事件
//!
//! 包到达某节点：转发，或在目的节点交给应用层。

use super::id::{ChannelId, NodeId};
use super::net_world::WanWorld;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 事件：把一个 packet 交给某个节点处理。`via` 为到达所经信道（本机回环为 None）。
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: NodeId,
    pub via: Option<ChannelId>,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, via, pkt } = *self;
        trace!(pkt_id = pkt.id, to = to.0, hops = pkt.hops_taken, now = %sim.now(), "数据包到达节点");

        let w = WanWorld::from_dyn(world);
        if let Some(pkt) = w.net.deliver(to, via, pkt, sim) {
            w.apps.on_local_delivery(to, pkt, sim, &mut w.net);
        }
    }
}
