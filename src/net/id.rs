//! 标识符类型
//!
//! 拓扑里的节点/链路用整数索引存储，名字 -> 索引由 `Topology` 查表。

use serde::Serialize;
use std::fmt;

/// 节点标识符（`Topology::nodes()` 中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// 链路标识符（`Topology::links()` 中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LinkId(pub usize);

/// 单向信道标识符：每条点对点链路拆成两个方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub usize);

impl ChannelId {
    /// `link` 的 a->b 方向
    pub fn forward(link: LinkId) -> Self {
        ChannelId(link.0 * 2)
    }

    /// `link` 的 b->a 方向
    pub fn reverse(link: LinkId) -> Self {
        ChannelId(link.0 * 2 + 1)
    }

    pub fn link(self) -> LinkId {
        LinkId(self.0 / 2)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}
