//! 流量定义
//!
//! 流与 ping 都按节点名引用端点；端点解析与校验在注册场景时完成。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::net::{DataRate, IpProtocol};
use crate::sim::SimTime;

/// 流的传输协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn ip_protocol(self) -> IpProtocol {
        match self {
            Protocol::Tcp => IpProtocol::Tcp,
            Protocol::Udp => IpProtocol::Udp,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        })
    }
}

/// 一条流：恒定速率发送端 + 目的端口上的接收端
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSpec {
    pub protocol: Protocol,
    pub src: String,
    pub dst: String,
    /// 目的地址取自哪条链路上的接口；省略时取目的节点第一条链路。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_link: Option<String>,
    pub port: u16,
    pub rate: DataRate,
    pub packet_bytes: u32,
    #[serde(with = "crate::sim::secs")]
    pub start: SimTime,
    #[serde(with = "crate::sim::secs")]
    pub stop: SimTime,
}

impl FlowSpec {
    /// 默认 1Mbps、512 字节、[0, 60s)
    pub fn new(protocol: Protocol, src: &str, dst: &str, port: u16) -> Self {
        Self {
            protocol,
            src: src.to_string(),
            dst: dst.to_string(),
            dst_link: None,
            port,
            rate: DataRate::from_mbps(1),
            packet_bytes: 512,
            start: SimTime::ZERO,
            stop: SimTime::from_secs(60),
        }
    }

    pub fn udp(src: &str, dst: &str, port: u16) -> Self {
        Self::new(Protocol::Udp, src, dst, port)
    }

    pub fn tcp(src: &str, dst: &str, port: u16) -> Self {
        Self::new(Protocol::Tcp, src, dst, port)
    }

    pub fn via(mut self, link: &str) -> Self {
        self.dst_link = Some(link.to_string());
        self
    }

    pub fn rate(mut self, rate: DataRate) -> Self {
        self.rate = rate;
        self
    }

    pub fn packet_bytes(mut self, bytes: u32) -> Self {
        self.packet_bytes = bytes;
        self
    }

    pub fn window(mut self, start: SimTime, stop: SimTime) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    /// 两个包之间的间隔：packet_bytes * 8 / rate
    pub fn interval(&self) -> SimTime {
        self.rate.tx_time(self.packet_bytes)
    }

    /// `[start, stop)` 是否与另一条流重叠
    pub fn overlaps(&self, other: &FlowSpec) -> bool {
        self.start < other.stop && other.start < self.stop
    }

    pub fn label(&self) -> String {
        format!("{} {}->{}:{}", self.protocol, self.src, self.dst, self.port)
    }
}

/// ICMP echo（ping）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingSpec {
    pub src: String,
    pub dst: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_link: Option<String>,
    #[serde(with = "crate::sim::secs")]
    pub interval: SimTime,
    pub size_bytes: u32,
    #[serde(with = "crate::sim::secs")]
    pub start: SimTime,
    #[serde(with = "crate::sim::secs")]
    pub stop: SimTime,
    #[serde(default)]
    pub verbose: bool,
}

impl PingSpec {
    /// 默认每秒一次、1024 字节
    pub fn new(src: &str, dst: &str) -> Self {
        Self {
            src: src.to_string(),
            dst: dst.to_string(),
            dst_link: None,
            interval: SimTime::from_secs(1),
            size_bytes: 1024,
            start: SimTime::ZERO,
            stop: SimTime::from_secs(60),
            verbose: false,
        }
    }

    pub fn via(mut self, link: &str) -> Self {
        self.dst_link = Some(link.to_string());
        self
    }

    pub fn window(mut self, start: SimTime, stop: SimTime) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn label(&self) -> String {
        format!("PING {}->{}", self.src, self.dst)
    }
}
