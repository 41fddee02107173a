//! 统计报告
//!
//! 运行结束后汇总成一份报告，用 serde_json 写到场景指定的文件。
//! 时间一律以秒（f64）输出。

use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use serde::Serialize;

use super::monitor::{FiveTuple, FlowId, FlowMonitor, FlowStats};
use crate::app::{Activation, PingReport, SenderReport};
use crate::error::{Error, Result};
use crate::net::{DropReason, IpProtocol, Stats};
use crate::sim::SimTime;

/// 单条流
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRecord {
    pub flow_id: FlowId,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub protocol: IpProtocol,
    pub src_port: u16,
    pub dst_port: u16,
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub lost_packets: u64,
    pub drops: BTreeMap<DropReason, u64>,
    pub delay_sum_s: f64,
    pub jitter_sum_s: f64,
    pub mean_delay_s: Option<f64>,
    pub mean_jitter_s: Option<f64>,
    pub rx_throughput_bps: Option<f64>,
    pub time_first_tx_s: Option<f64>,
    pub time_last_tx_s: Option<f64>,
    pub time_first_rx_s: Option<f64>,
    pub time_last_rx_s: Option<f64>,
}

impl FlowRecord {
    fn new(flow_id: FlowId, t: &FiveTuple, s: &FlowStats) -> Self {
        let secs = |t: Option<SimTime>| t.map(SimTime::as_secs_f64);
        Self {
            flow_id,
            src_addr: t.src,
            dst_addr: t.dst,
            protocol: t.protocol,
            src_port: t.src_port,
            dst_port: t.dst_port,
            tx_packets: s.tx_packets,
            tx_bytes: s.tx_bytes,
            rx_packets: s.rx_packets,
            rx_bytes: s.rx_bytes,
            lost_packets: s.lost_packets(),
            drops: s.drops.clone(),
            delay_sum_s: s.delay_sum.as_secs_f64(),
            jitter_sum_s: s.jitter_sum.as_secs_f64(),
            mean_delay_s: secs(s.mean_delay()),
            mean_jitter_s: secs(s.mean_jitter()),
            rx_throughput_bps: s.rx_throughput_bps(),
            time_first_tx_s: secs(s.first_tx),
            time_last_tx_s: secs(s.last_tx),
            time_first_rx_s: secs(s.first_rx),
            time_last_rx_s: secs(s.last_rx),
        }
    }
}

/// 一次运行的统计报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub scenario: String,
    #[serde(with = "crate::sim::secs")]
    pub horizon: SimTime,
    pub events: u64,
    pub network: Stats,
    pub flows: Vec<FlowRecord>,
    pub senders: Vec<SenderReport>,
    pub pings: Vec<PingReport>,
    pub activations: Vec<Activation>,
}

impl StatsReport {
    pub fn flow_records(monitor: &FlowMonitor) -> Vec<FlowRecord> {
        monitor
            .flows()
            .map(|(id, t, s)| FlowRecord::new(id, t, s))
            .collect()
    }

    /// 写成缩进 JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
