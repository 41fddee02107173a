//! RED（Random Early Detection）主动队列管理
//!
//! gentle 模式的 RED：平均队长在 [min_th, max_th) 之间按线性概率提前丢包，
//! [max_th, 2*max_th) 之间概率线性升到 1，超过后全部丢弃。
//! 队列满时强制尾丢弃。随机数来自按链路播种的 splitmix64，结果可复现。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::net::{DropReason, Packet};

use super::{Dropped, PacketQueue};

/// RED 参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedParams {
    /// 平均队长下门限（包）
    pub min_th: f64,
    /// 平均队长上门限（包）
    pub max_th: f64,
    /// EWMA 权重
    pub weight: f64,
    /// 上门限处的最大丢弃概率
    pub max_p: f64,
    pub gentle: bool,
}

impl Default for RedParams {
    fn default() -> Self {
        Self {
            min_th: 5.0,
            max_th: 15.0,
            weight: 0.002,
            max_p: 1.0 / 50.0,
            gentle: true,
        }
    }
}

#[derive(Debug)]
pub struct RedQueue {
    params: RedParams,
    max_pkts: u32,
    avg: f64,
    /// 距上次提前丢包以来进入概率区间的包数
    count: u32,
    rng: u64,
    q: VecDeque<Packet>,
}

impl RedQueue {
    pub fn new(params: RedParams, max_pkts: u32, seed: u64) -> Self {
        Self {
            params,
            max_pkts,
            avg: 0.0,
            count: 0,
            rng: seed,
            q: VecDeque::new(),
        }
    }

    /// 当前平均队长
    pub fn avg(&self) -> f64 {
        self.avg
    }

    fn next_unit(&mut self) -> f64 {
        self.rng = self.rng.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.rng;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    fn early_drop(&mut self, pb: f64) -> bool {
        self.count = self.count.saturating_add(1);
        let denom = 1.0 - self.count as f64 * pb;
        let pa = if denom <= 0.0 { 1.0 } else { (pb / denom).min(1.0) };
        if self.next_unit() < pa {
            self.count = 0;
            true
        } else {
            false
        }
    }

    fn should_drop(&mut self) -> bool {
        let RedParams {
            min_th,
            max_th,
            max_p,
            gentle,
            ..
        } = self.params;
        if self.avg < min_th {
            self.count = 0;
            false
        } else if self.avg < max_th {
            let pb = max_p * (self.avg - min_th) / (max_th - min_th);
            self.early_drop(pb)
        } else if gentle && self.avg < 2.0 * max_th {
            let pb = max_p + (1.0 - max_p) * (self.avg - max_th) / max_th;
            self.early_drop(pb)
        } else {
            self.count = 0;
            true
        }
    }
}

impl PacketQueue for RedQueue {
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Dropped> {
        let w = self.params.weight;
        self.avg = (1.0 - w) * self.avg + w * self.q.len() as f64;

        if self.q.len() >= self.max_pkts as usize {
            return Err(Dropped {
                pkt,
                reason: DropReason::QueueFull,
            });
        }
        if self.should_drop() {
            return Err(Dropped {
                pkt,
                reason: DropReason::AqmEarly,
            });
        }
        self.q.push_back(pkt);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Packet> {
        self.q.pop_front()
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn capacity_pkts(&self) -> u32 {
        self.max_pkts
    }
}
