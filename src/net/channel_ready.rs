//! 信道就绪事件（用于驱动队列出队）

use super::id::ChannelId;
use super::net_world::WanWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：信道完成一次串行化后在 depart 时刻触发，尝试发送队列中的下一个 packet。
#[derive(Debug)]
pub struct ChannelReady {
    pub channel: ChannelId,
}

impl Event for ChannelReady {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        WanWorld::from_dyn(world)
            .net
            .on_channel_ready(self.channel, sim);
    }
}
