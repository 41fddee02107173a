//! 全局路由表
//!
//! 点对点链路全双工，所有链路代价为 1（按跳数最短）。对每个目的节点在
//! 邻接表上做一次 BFS，得到各节点到它的距离；下一跳取邻接表里第一个
//! 满足 dist[next] = dist[from] - 1 的邻居。邻接表按链路声明顺序构造，
//! 所以同样的拓扑总得到同样的路由。

use std::collections::VecDeque;

use super::id::NodeId;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    n: usize,
    /// dist[dst * n + from]：from 到 dst 的跳数，不可达为 None
    dist: Vec<Option<u32>>,
    /// next[dst * n + from]
    next: Vec<Option<NodeId>>,
}

impl RoutingTable {
    /// `adj[v]` 为 v 的所有邻居（按链路声明顺序）。
    pub fn build(adj: &[Vec<NodeId>]) -> Self {
        let n = adj.len();
        let mut dist = vec![None; n * n];
        let mut next = vec![None; n * n];
        let mut q: VecDeque<NodeId> = VecDeque::new();

        for dst_idx in 0..n {
            let row = dst_idx * n;
            q.clear();
            dist[row + dst_idx] = Some(0);
            q.push_back(NodeId(dst_idx));

            while let Some(v) = q.pop_front() {
                let dv = dist[row + v.0].unwrap_or(0);
                for &nb in &adj[v.0] {
                    if dist[row + nb.0].is_none() {
                        dist[row + nb.0] = Some(dv + 1);
                        q.push_back(nb);
                    }
                }
            }

            for from_idx in 0..n {
                if from_idx == dst_idx {
                    continue;
                }
                let Some(df) = dist[row + from_idx] else {
                    continue; // unreachable
                };
                next[row + from_idx] = adj[from_idx]
                    .iter()
                    .copied()
                    .find(|nh| dist[row + nh.0] == Some(df - 1));
            }
        }

        Self { n, dist, next }
    }

    pub fn node_count(&self) -> usize {
        self.n
    }

    /// from -> dst 的下一跳；from == dst 或不可达时为 None。
    pub fn next_hop(&self, from: NodeId, dst: NodeId) -> Option<NodeId> {
        if from.0 >= self.n || dst.0 >= self.n {
            return None;
        }
        self.next[dst.0 * self.n + from.0]
    }

    /// from -> dst 的跳数
    pub fn hops(&self, from: NodeId, dst: NodeId) -> Option<u32> {
        if from.0 >= self.n || dst.0 >= self.n {
            return None;
        }
        self.dist[dst.0 * self.n + from.0]
    }

    /// 从 `from` 出发沿下一跳走到 `dst` 的完整路径（含两端）。
    pub fn path(&self, from: NodeId, dst: NodeId) -> Option<Vec<NodeId>> {
        let hops = self.hops(from, dst)?;
        let mut path = Vec::with_capacity(hops as usize + 1);
        let mut at = from;
        path.push(at);
        while at != dst {
            at = self.next_hop(at, dst)?;
            path.push(at);
        }
        Some(path)
    }

    /// 从 `src` 不可达的节点
    pub fn unreachable_from(&self, src: NodeId) -> Vec<NodeId> {
        (0..self.n)
            .map(NodeId)
            .filter(|&v| self.hops(src, v).is_none())
            .collect()
    }
}
