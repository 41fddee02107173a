//! 单向信道
//!
//! 一条点对点链路在引擎里拆成两个方向的信道，各自有队列和发送状态。

use std::net::Ipv4Addr;

use super::data_rate::DataRate;
use super::id::{ChannelId, LinkId, NodeId};
use crate::queue::PacketQueue;
use crate::sim::SimTime;

#[derive(Debug)]
pub struct Channel {
    pub id: ChannelId,
    pub link: LinkId,
    pub from: NodeId,
    pub to: NodeId,
    /// 发送端在这条链路上的接口地址
    pub from_addr: Ipv4Addr,
    pub rate: DataRate,
    pub delay: SimTime,
    /// 正在串行化一个包
    pub busy: bool,
    pub queue: Box<dyn PacketQueue>,
}
