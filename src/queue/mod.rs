//! 队列策略（Queue disciplines）
//!
//! 每条单向信道挂一个队列：DropTail（尾丢弃）或 RED（主动队列管理）。
//! 容量按包数计。

use serde::{Deserialize, Serialize};

use crate::net::{DropReason, Packet};

mod drop_tail;
mod red;

pub use drop_tail::DropTailQueue;
pub use red::{RedParams, RedQueue};

/// 被队列拒绝的包及原因
#[derive(Debug)]
pub struct Dropped {
    pub pkt: Packet,
    pub reason: DropReason,
}

/// Packet 队列抽象
pub trait PacketQueue: std::fmt::Debug {
    /// 入队：成功返回 Ok；若被丢弃则把包原样还回
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Dropped>;
    /// 出队：按队列策略返回下一个 packet
    fn dequeue(&mut self) -> Option<Packet>;

    fn len(&self) -> usize;
    fn capacity_pkts(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 排队策略种类
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueueDiscipline {
    DropTail,
    Red(RedParams),
}

/// 一类链路的排队策略 + 容量（包）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub discipline: QueueDiscipline,
    pub capacity_pkts: u32,
}

impl QueueSpec {
    pub fn drop_tail(capacity_pkts: u32) -> Self {
        Self {
            discipline: QueueDiscipline::DropTail,
            capacity_pkts,
        }
    }

    pub fn red(capacity_pkts: u32) -> Self {
        Self {
            discipline: QueueDiscipline::Red(RedParams::default()),
            capacity_pkts,
        }
    }

    /// 实例化一个队列；`seed` 只影响 RED 的随机丢弃序列。
    pub fn build(&self, seed: u64) -> Box<dyn PacketQueue> {
        match self.discipline {
            QueueDiscipline::DropTail => Box::new(DropTailQueue::new(self.capacity_pkts)),
            QueueDiscipline::Red(params) => {
                Box::new(RedQueue::new(params, self.capacity_pkts, seed))
            }
        }
    }
}
