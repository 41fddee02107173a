//! 数据包类型
//!
//! 定义网络数据包（IPv4 + 传输层最小字段）及其相关操作。

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::sim::SimTime;

pub const IPV4_HEADER_BYTES: u32 = 20;
pub const UDP_HEADER_BYTES: u32 = 8;
pub const TCP_HEADER_BYTES: u32 = 20;
pub const ICMP_HEADER_BYTES: u32 = 8;
/// 点对点链路的帧头（PPP）
pub const P2P_FRAMING_BYTES: u32 = 2;

/// IP 层协议号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
}

impl IpProtocol {
    pub fn number(self) -> u8 {
        match self {
            IpProtocol::Icmp => 1,
            IpProtocol::Tcp => 6,
            IpProtocol::Udp => 17,
        }
    }

    pub fn header_bytes(self) -> u32 {
        match self {
            IpProtocol::Icmp => ICMP_HEADER_BYTES,
            IpProtocol::Tcp => TCP_HEADER_BYTES,
            IpProtocol::Udp => UDP_HEADER_BYTES,
        }
    }
}

/// 载荷种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Udp,
    TcpData { seq: u64 },
    TcpAck { ack: u64 },
    EchoRequest { ident: u16, seq: u64 },
    EchoReply { ident: u16, seq: u64 },
}

impl Payload {
    pub fn protocol(self) -> IpProtocol {
        match self {
            Payload::Udp => IpProtocol::Udp,
            Payload::TcpData { .. } | Payload::TcpAck { .. } => IpProtocol::Tcp,
            Payload::EchoRequest { .. } | Payload::EchoReply { .. } => IpProtocol::Icmp,
        }
    }
}

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    /// 应用层载荷字节数
    pub payload_bytes: u32,
    pub payload: Payload,
    /// 源节点把包交给网络层的时刻（用于时延统计）
    pub sent_at: SimTime,
    pub hops_taken: u32,
}

impl Packet {
    pub fn protocol(&self) -> IpProtocol {
        self.payload.protocol()
    }

    /// IP 层字节数（flow monitor 统计口径）
    pub fn ip_bytes(&self) -> u32 {
        self.payload_bytes
            .saturating_add(IPV4_HEADER_BYTES)
            .saturating_add(self.protocol().header_bytes())
    }

    /// 线上字节数（用于计算串行化时延）
    pub fn wire_bytes(&self) -> u32 {
        self.ip_bytes().saturating_add(P2P_FRAMING_BYTES)
    }

    /// 前进一跳
    pub fn advance(mut self) -> Self {
        self.hops_taken += 1;
        self
    }
}

/// 发包请求：应用只给出地址/端口/载荷，包 id 与发送时间由网络层填。
#[derive(Debug, Clone, Copy)]
pub struct Datagram {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub payload_bytes: u32,
    pub payload: Payload,
}

