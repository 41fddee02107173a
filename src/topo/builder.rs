//! 拓扑构建
//!
//! 节点按整数下标存放，另有 名字 -> 下标 的查找表；下游（地址、场景）
//! 只通过名字或下标引用节点，不持有节点本身。构建完成后拓扑只读。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TopologyError;
use crate::net::{DataRate, LinkId, NodeId};
use crate::sim::SimTime;

/// 节点所属区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Global,
    SouthAmerica,
    NorthAmerica,
}

/// 链路类别（决定排队策略）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkClass {
    /// 全球骨干（G-G）
    Backbone,
    /// 区域汇聚（L-G、L-L）
    Regional,
    /// 接入（主机-L）
    Access,
}

/// 节点声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDecl {
    pub name: String,
    pub region: Region,
}

/// 链路声明（有序端点对）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDecl {
    pub name: String,
    pub a: String,
    pub b: String,
    pub rate: DataRate,
    pub delay: SimTime,
    pub class: LinkClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub a: NodeId,
    pub b: NodeId,
    pub rate: DataRate,
    pub delay: SimTime,
    pub class: LinkClass,
}

impl Link {
    pub fn has_endpoint(&self, node: NodeId) -> bool {
        self.a == node || self.b == node
    }

    /// `node` 的对端
    pub fn peer(&self, node: NodeId) -> Option<NodeId> {
        if node == self.a {
            Some(self.b)
        } else if node == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// 构建完成的拓扑（只读）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_index: HashMap<String, NodeId>,
    link_index: HashMap<String, LinkId>,
}

impl Topology {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    /// 名字 -> 节点
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.node_index.get(name).copied()
    }

    /// 名字 -> 链路
    pub fn lookup_link(&self, name: &str) -> Option<LinkId> {
        self.link_index.get(name).copied()
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// 无向邻接表（按链路声明顺序），供路由计算使用
    pub fn adjacency(&self) -> Vec<Vec<NodeId>> {
        let mut adj = vec![Vec::new(); self.nodes.len()];
        for link in &self.links {
            adj[link.a.0].push(link.b);
            adj[link.b.0].push(link.a);
        }
        adj
    }

    /// 与 `node` 相连的链路（按声明顺序）
    pub fn links_of(&self, node: NodeId) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter().filter(move |l| l.has_endpoint(node))
    }
}

/// 拓扑构建器
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_index: HashMap<String, NodeId>,
    link_index: HashMap<String, LinkId>,
    pairs: HashMap<(NodeId, NodeId), LinkId>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由节点表 + 链路表一次性构建
    #[tracing::instrument(skip_all, fields(nodes = nodes.len(), links = links.len()))]
    pub fn from_table(nodes: &[NodeDecl], links: &[LinkDecl]) -> Result<Topology, TopologyError> {
        let mut b = Self::new();
        for n in nodes {
            b.add_node(&n.name, n.region)?;
        }
        for l in links {
            b.add_link(l)?;
        }
        let topo = b.build();
        info!(
            nodes = topo.nodes().len(),
            links = topo.links().len(),
            "🧱 拓扑构建完成"
        );
        Ok(topo)
    }

    pub fn add_node(&mut self, name: &str, region: Region) -> Result<NodeId, TopologyError> {
        if self.node_index.contains_key(name) {
            return Err(TopologyError::DuplicateNode {
                name: name.to_string(),
            });
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            name: name.to_string(),
            region,
        });
        self.node_index.insert(name.to_string(), id);
        debug!(node = name, ?region, id = id.0, "添加节点");
        Ok(id)
    }

    pub fn add_link(&mut self, decl: &LinkDecl) -> Result<LinkId, TopologyError> {
        let resolve = |name: &str| {
            self.node_index
                .get(name)
                .copied()
                .ok_or_else(|| TopologyError::UnknownNode {
                    link: decl.name.clone(),
                    node: name.to_string(),
                })
        };
        let a = resolve(&decl.a)?;
        let b = resolve(&decl.b)?;

        if a == b {
            return Err(TopologyError::SelfLoop {
                link: decl.name.clone(),
                node: decl.a.clone(),
            });
        }
        if let Some(prev) = self.pairs.get(&(a, b)) {
            return Err(TopologyError::DuplicateLink {
                from: decl.a.clone(),
                to: decl.b.clone(),
                first: self.links[prev.0].name.clone(),
                second: decl.name.clone(),
            });
        }
        if self.link_index.contains_key(&decl.name) {
            return Err(TopologyError::DuplicateLinkName {
                name: decl.name.clone(),
            });
        }

        let id = LinkId(self.links.len());
        self.links.push(Link {
            id,
            name: decl.name.clone(),
            a,
            b,
            rate: decl.rate,
            delay: decl.delay,
            class: decl.class,
        });
        self.pairs.insert((a, b), id);
        self.link_index.insert(decl.name.clone(), id);
        debug!(link = %decl.name, rate = %decl.rate, delay = %decl.delay, class = ?decl.class, "添加链路");
        Ok(id)
    }

    pub fn build(self) -> Topology {
        Topology {
            nodes: self.nodes,
            links: self.links,
            node_index: self.node_index,
            link_index: self.link_index,
        }
    }
}
