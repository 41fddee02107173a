//! 网络模拟模块
//!
//! 运行期网络：数据包、单向信道、路由表、转发与交付事件、网络层计数。

mod channel;
mod channel_ready;
mod data_rate;
mod deliver_packet;
mod id;
mod net_world;
mod network;
mod packet;
mod routing;
mod stats;

pub use channel::Channel;
pub use channel_ready::ChannelReady;
pub use data_rate::{DataRate, ParseRateError};
pub use deliver_packet::DeliverPacket;
pub use id::{ChannelId, LinkId, NodeId};
pub use net_world::WanWorld;
pub use network::Network;
pub use packet::{
    Datagram, IpProtocol, Packet, Payload, ICMP_HEADER_BYTES, IPV4_HEADER_BYTES,
    P2P_FRAMING_BYTES, TCP_HEADER_BYTES, UDP_HEADER_BYTES,
};
pub use routing::RoutingTable;
pub use stats::{DropReason, Stats};
