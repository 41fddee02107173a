//! 地址分配
//!
//! 每条链路一个 /24。网段不是算出来的，而是由人工维护的台账给定
//! (链路名, 网段基址)，分配器只负责校验并展开成接口地址：
//! 链路第一个端点 `.1`，第二个端点 `.2`。

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::{debug, info};

use super::builder::Topology;
use crate::error::AddressError;
use crate::net::{LinkId, NodeId};

pub const SUBNET_PREFIX_LEN: u8 = 24;

/// 链路网段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Subnet {
    pub link: LinkId,
    pub base: Ipv4Addr,
    pub prefix_len: u8,
}

impl Subnet {
    pub fn mask(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::MAX << (32 - self.prefix_len as u32))
    }

    pub fn host(&self, n: u8) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.base) | n as u32)
    }

    /// 链路第一个端点的地址
    pub fn a_addr(&self) -> Ipv4Addr {
        self.host(1)
    }

    /// 链路第二个端点的地址
    pub fn b_addr(&self) -> Ipv4Addr {
        self.host(2)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & u32::from(self.mask()) == u32::from(self.base)
    }
}

/// 地址台账：链路名 -> 网段基址（保持声明顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressLedger {
    entries: Vec<(String, Ipv4Addr)>,
}

impl AddressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, link: impl Into<String>, base: Ipv4Addr) -> Self {
        self.entries.push((link.into(), base));
        self
    }

    pub fn push(&mut self, link: impl Into<String>, base: Ipv4Addr) {
        self.entries.push((link.into(), base));
    }

    pub fn entries(&self) -> &[(String, Ipv4Addr)] {
        &self.entries
    }
}

/// 地址分配结果（只读）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPlan {
    /// 按 LinkId 下标
    subnets: Vec<Subnet>,
    owners: BTreeMap<Ipv4Addr, NodeId>,
}

impl AddressPlan {
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    pub fn subnet(&self, link: LinkId) -> &Subnet {
        &self.subnets[link.0]
    }

    /// 链路两端的地址 (a 侧, b 侧)
    pub fn addresses(&self, link: LinkId) -> (Ipv4Addr, Ipv4Addr) {
        let s = &self.subnets[link.0];
        (s.a_addr(), s.b_addr())
    }

    /// `node` 在 `link` 上的地址
    pub fn address_on(&self, topo: &Topology, link: LinkId, node: NodeId) -> Option<Ipv4Addr> {
        let l = topo.link(link);
        let s = &self.subnets[link.0];
        if l.a == node {
            Some(s.a_addr())
        } else if l.b == node {
            Some(s.b_addr())
        } else {
            None
        }
    }

    /// `node` 的所有接口地址（按链路声明顺序）
    pub fn addresses_of(&self, topo: &Topology, node: NodeId) -> Vec<Ipv4Addr> {
        topo.links_of(node)
            .filter_map(|l| self.address_on(topo, l.id, node))
            .collect()
    }

    pub fn owner(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.owners.get(&addr).copied()
    }

    pub fn owners(&self) -> impl Iterator<Item = (Ipv4Addr, NodeId)> + '_ {
        self.owners.iter().map(|(a, n)| (*a, *n))
    }
}

/// 按台账给每条链路分配 /24
pub struct AddressAllocator;

impl AddressAllocator {
    #[tracing::instrument(skip_all, fields(links = topo.links().len(), entries = ledger.entries().len()))]
    pub fn allocate(topo: &Topology, ledger: &AddressLedger) -> Result<AddressPlan, AddressError> {
        let mut by_link: Vec<Option<Ipv4Addr>> = vec![None; topo.links().len()];
        let mut by_base: HashMap<Ipv4Addr, LinkId> = HashMap::new();

        for (name, base) in ledger.entries() {
            let link = topo
                .lookup_link(name)
                .ok_or_else(|| AddressError::UnknownLink { link: name.clone() })?;
            if u32::from(*base) & 0xff != 0 {
                return Err(AddressError::Misaligned {
                    link: name.clone(),
                    base: *base,
                });
            }
            if by_link[link.0].is_some() {
                return Err(AddressError::DuplicateEntry { link: name.clone() });
            }
            if let Some(prev) = by_base.insert(*base, link) {
                return Err(AddressError::Conflict {
                    base: *base,
                    first: topo.link(prev).name.clone(),
                    second: name.clone(),
                });
            }
            by_link[link.0] = Some(*base);
        }

        let mut subnets = Vec::with_capacity(topo.links().len());
        let mut owners = BTreeMap::new();
        for link in topo.links() {
            let base = by_link[link.id.0].ok_or_else(|| AddressError::Missing {
                link: link.name.clone(),
            })?;
            let subnet = Subnet {
                link: link.id,
                base,
                prefix_len: SUBNET_PREFIX_LEN,
            };
            owners.insert(subnet.a_addr(), link.a);
            owners.insert(subnet.b_addr(), link.b);
            debug!(
                link = %link.name,
                a = %subnet.a_addr(),
                b = %subnet.b_addr(),
                "分配网段"
            );
            subnets.push(subnet);
        }

        info!(subnets = subnets.len(), "🏷️  地址分配完成");
        Ok(AddressPlan { subnets, owners })
    }
}
