//! 统计信息
//!
//! 网络层的全局计数（与按流统计的 FlowMonitor 相互独立，关掉 monitor 也保留）。

use std::collections::BTreeMap;

use serde::Serialize;

/// 丢包原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// 队列已满（尾丢弃）
    QueueFull,
    /// AQM 提前丢弃
    AqmEarly,
    /// 目的地址没有归属节点或不可达
    NoRoute,
    /// 目的端口上没有处于激活状态的接收端
    NoListener,
}

/// 网络统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub sent_pkts: u64,
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    pub dropped_pkts: u64,
    pub drops_by_reason: BTreeMap<DropReason, u64>,
}

impl Stats {
    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        self.dropped_pkts += 1;
        *self.drops_by_reason.entry(reason).or_default() += 1;
    }
}
