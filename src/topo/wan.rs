//! 三区域 WAN 拓扑
//!
//! 全球骨干 G1-G2-G3，南美接入（L1/L2 汇聚，S1..S4 主机），
//! 北美接入（L3/L4/L5 汇聚，N1..N8 主机）：
//!
//! ```text
//! 骨干:  G1 ==(20ms)== G2 ==(100ms)== G3
//! 南美:  S1,S2,S3 - L1 - G2    S4 - L2 - G1    L1 - L2
//! 北美:  N1,N2,N3 - L3 - G3    N4,N5,N6 - L4 - G3    N7,N8 - L5 - G3
//!        L3 - L4    L3 - L5
//! ```
//!
//! 所有链路与网段都在下面两张表里，改拓扑只改表。

use std::net::Ipv4Addr;

use super::address::AddressLedger;
use super::builder::LinkClass::{self, Access, Backbone, Regional};
use super::builder::{LinkDecl, NodeDecl, Region, Topology, TopologyBuilder};
use crate::error::TopologyError;
use crate::net::DataRate;
use crate::sim::SimTime;

const NODES: &[(&str, Region)] = &[
    ("G1", Region::Global),
    ("G2", Region::Global),
    ("G3", Region::Global),
    ("L1", Region::SouthAmerica),
    ("S1", Region::SouthAmerica),
    ("S2", Region::SouthAmerica),
    ("S3", Region::SouthAmerica),
    ("L2", Region::SouthAmerica),
    ("S4", Region::SouthAmerica),
    ("L3", Region::NorthAmerica),
    ("N1", Region::NorthAmerica),
    ("N2", Region::NorthAmerica),
    ("N3", Region::NorthAmerica),
    ("L4", Region::NorthAmerica),
    ("N4", Region::NorthAmerica),
    ("N5", Region::NorthAmerica),
    ("N6", Region::NorthAmerica),
    ("L5", Region::NorthAmerica),
    ("N7", Region::NorthAmerica),
    ("N8", Region::NorthAmerica),
];

struct LinkRow {
    a: &'static str,
    b: &'static str,
    mbps: u64,
    delay_ms: u64,
    class: LinkClass,
}

const fn row(a: &'static str, b: &'static str, mbps: u64, delay_ms: u64, class: LinkClass) -> LinkRow {
    LinkRow {
        a,
        b,
        mbps,
        delay_ms,
        class,
    }
}

const LINKS: &[LinkRow] = &[
    // 全球骨干
    row("G1", "G2", 100, 20, Backbone),
    row("G2", "G3", 100, 100, Backbone),
    // 南美
    row("S1", "L1", 5, 10, Access),
    row("S2", "L1", 5, 10, Access),
    row("S3", "L1", 5, 10, Access),
    row("S4", "L2", 5, 10, Access),
    row("L1", "G2", 20, 20, Regional),
    row("L2", "G1", 20, 20, Regional),
    row("L1", "L2", 20, 20, Regional),
    // 北美
    row("L3", "G3", 50, 40, Regional),
    row("L3", "L5", 100, 40, Regional),
    row("L3", "L4", 20, 20, Regional),
    row("L4", "G3", 20, 20, Regional),
    row("N1", "L3", 10, 5, Access),
    row("N2", "L3", 10, 5, Access),
    row("N3", "L3", 10, 5, Access),
    row("N4", "L4", 10, 5, Access),
    row("N5", "L4", 10, 5, Access),
    row("N6", "L4", 10, 5, Access),
    row("N7", "L5", 10, 5, Access),
    row("N8", "L5", 10, 5, Access),
    row("L5", "G3", 10, 5, Regional),
];

/// 网段台账：骨干 10.0.x.0，南美 10.55.x.0，北美 10.1.x.0
const LEDGER: &[(&str, [u8; 4])] = &[
    ("G1_G2", [10, 0, 1, 0]),
    ("G2_G3", [10, 0, 2, 0]),
    ("S1_L1", [10, 55, 4, 0]),
    ("S2_L1", [10, 55, 2, 0]),
    ("S3_L1", [10, 55, 3, 0]),
    ("S4_L2", [10, 55, 7, 0]),
    ("L1_G2", [10, 55, 1, 0]),
    ("L2_G1", [10, 55, 5, 0]),
    ("L1_L2", [10, 55, 6, 0]),
    ("L3_L5", [10, 1, 10, 0]),
    ("N1_L3", [10, 1, 7, 0]),
    ("N2_L3", [10, 1, 8, 0]),
    ("N3_L3", [10, 1, 9, 0]),
    ("L4_G3", [10, 1, 1, 0]),
    ("N4_L4", [10, 1, 3, 0]),
    ("N5_L4", [10, 1, 5, 0]),
    ("N6_L4", [10, 1, 2, 0]),
    ("L5_G3", [10, 1, 13, 0]),
    ("N7_L5", [10, 1, 11, 0]),
    ("N8_L5", [10, 1, 12, 0]),
    ("L3_L4", [10, 1, 4, 0]),
    // 北美段里唯一空着的 /24
    ("L3_G3", [10, 1, 6, 0]),
];

pub fn wan_nodes() -> Vec<NodeDecl> {
    NODES
        .iter()
        .map(|&(name, region)| NodeDecl {
            name: name.to_string(),
            region,
        })
        .collect()
}

/// 链路名取 "{a}_{b}"
pub fn wan_links() -> Vec<LinkDecl> {
    LINKS
        .iter()
        .map(|r| LinkDecl {
            name: format!("{}_{}", r.a, r.b),
            a: r.a.to_string(),
            b: r.b.to_string(),
            rate: DataRate::from_mbps(r.mbps),
            delay: SimTime::from_millis(r.delay_ms),
            class: r.class,
        })
        .collect()
}

pub fn wan_ledger() -> AddressLedger {
    let mut ledger = AddressLedger::new();
    for &(link, [a, b, c, d]) in LEDGER {
        ledger.push(link, Ipv4Addr::new(a, b, c, d));
    }
    ledger
}

/// 构建三区域 WAN 拓扑
pub fn build_wan() -> Result<Topology, TopologyError> {
    TopologyBuilder::from_table(&wan_nodes(), &wan_links())
}
