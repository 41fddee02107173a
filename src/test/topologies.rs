use std::collections::HashSet;

use crate::error::TopologyError;
use crate::net::{DataRate, LinkId, NodeId};
use crate::sim::SimTime;
use crate::topo::wan::{build_wan, wan_links, wan_nodes};
use crate::topo::{LinkClass, LinkDecl, Region, TopologyBuilder};

fn link(a: &str, b: &str) -> LinkDecl {
    LinkDecl {
        name: format!("{a}_{b}"),
        a: a.to_string(),
        b: b.to_string(),
        rate: DataRate::from_mbps(10),
        delay: SimTime::from_millis(5),
        class: LinkClass::Access,
    }
}

#[test]
fn wan_has_twenty_nodes_and_twenty_two_links() {
    let topo = build_wan().expect("wan");
    assert_eq!(topo.nodes().len(), 20);
    assert_eq!(topo.links().len(), 22);

    let names: HashSet<_> = topo.nodes().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names.len(), 20);
    for name in ["G1", "G2", "G3", "L1", "L5", "S4", "N8"] {
        assert!(names.contains(name), "{name} missing");
    }

    let pairs: HashSet<_> = topo.links().iter().map(|l| (l.a, l.b)).collect();
    assert_eq!(pairs.len(), 22);
}

#[test]
fn wan_link_attributes_follow_the_table() {
    let topo = build_wan().expect("wan");
    let g1 = topo.lookup("G1").expect("G1");
    let g2 = topo.lookup("G2").expect("G2");

    let backbone = topo.link(topo.lookup_link("G1_G2").expect("G1_G2"));
    assert_eq!((backbone.a, backbone.b), (g1, g2));
    assert_eq!(backbone.rate, DataRate::from_mbps(100));
    assert_eq!(backbone.delay, SimTime::from_millis(20));
    assert_eq!(backbone.class, LinkClass::Backbone);

    let access = topo.link(topo.lookup_link("S1_L1").expect("S1_L1"));
    assert_eq!(access.rate, DataRate::from_mbps(5));
    assert_eq!(access.delay, SimTime::from_millis(10));
    assert_eq!(access.class, LinkClass::Access);

    let regional = topo.link(topo.lookup_link("L5_G3").expect("L5_G3"));
    assert_eq!(regional.rate, DataRate::from_mbps(10));
    assert_eq!(regional.class, LinkClass::Regional);

    assert_eq!(topo.node(g1).region, Region::Global);
    assert_eq!(
        topo.node(topo.lookup("S4").expect("S4")).region,
        Region::SouthAmerica
    );
    assert_eq!(
        topo.node(topo.lookup("N7").expect("N7")).region,
        Region::NorthAmerica
    );
}

#[test]
fn lookup_resolves_names_and_rejects_unknown() {
    let topo = build_wan().expect("wan");
    assert_eq!(topo.lookup("G1"), Some(NodeId(0)));
    assert_eq!(topo.lookup("N8"), Some(NodeId(19)));
    assert_eq!(topo.lookup("X9"), None);
    assert_eq!(topo.lookup_link("L5_G3"), Some(LinkId(21)));
    assert_eq!(topo.lookup_link("G3_L5"), None);
    assert_eq!(topo.node_name(NodeId(3)), "L1");
}

#[test]
fn peers_and_links_of_a_node() {
    let topo = build_wan().expect("wan");
    let l1 = topo.lookup("L1").expect("L1");
    let s1_l1 = topo.link(topo.lookup_link("S1_L1").expect("S1_L1"));
    assert_eq!(s1_l1.peer(l1), topo.lookup("S1"));
    assert_eq!(s1_l1.peer(topo.lookup("G1").expect("G1")), None);

    let names: Vec<_> = topo.links_of(l1).map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["S1_L1", "S2_L1", "S3_L1", "L1_G2", "L1_L2"]);
}

#[test]
fn duplicate_node_is_rejected() {
    let mut b = TopologyBuilder::new();
    b.add_node("A", Region::Global).expect("A");
    let err = b.add_node("A", Region::NorthAmerica).expect_err("duplicate");
    assert_eq!(
        err,
        TopologyError::DuplicateNode {
            name: "A".to_string()
        }
    );
}

#[test]
fn duplicate_ordered_pair_is_rejected() {
    let mut b = TopologyBuilder::new();
    b.add_node("A", Region::Global).expect("A");
    b.add_node("B", Region::Global).expect("B");
    b.add_link(&link("A", "B")).expect("first");

    let mut again = link("A", "B");
    again.name = "A_B_bis".to_string();
    let err = b.add_link(&again).expect_err("duplicate pair");
    assert!(matches!(
        err,
        TopologyError::DuplicateLink { ref first, ref second, .. }
            if first == "A_B" && second == "A_B_bis"
    ));
}

#[test]
fn reversed_pair_is_a_distinct_declaration() {
    let mut b = TopologyBuilder::new();
    b.add_node("A", Region::Global).expect("A");
    b.add_node("B", Region::Global).expect("B");
    b.add_link(&link("A", "B")).expect("A_B");
    b.add_link(&link("B", "A")).expect("B_A");
    assert_eq!(b.build().links().len(), 2);
}

#[test]
fn malformed_links_are_rejected() {
    let mut b = TopologyBuilder::new();
    b.add_node("A", Region::Global).expect("A");
    b.add_node("B", Region::Global).expect("B");

    assert_eq!(
        b.add_link(&link("A", "A")),
        Err(TopologyError::SelfLoop {
            link: "A_A".to_string(),
            node: "A".to_string(),
        })
    );
    assert_eq!(
        b.add_link(&link("A", "Z")),
        Err(TopologyError::UnknownNode {
            link: "A_Z".to_string(),
            node: "Z".to_string(),
        })
    );

    b.add_link(&link("A", "B")).expect("A_B");
    let mut renamed = link("B", "A");
    renamed.name = "A_B".to_string();
    assert_eq!(
        b.add_link(&renamed),
        Err(TopologyError::DuplicateLinkName {
            name: "A_B".to_string()
        })
    );
}

#[test]
fn identical_tables_build_identical_topologies() {
    let a = TopologyBuilder::from_table(&wan_nodes(), &wan_links()).expect("a");
    let b = TopologyBuilder::from_table(&wan_nodes(), &wan_links()).expect("b");
    assert_eq!(a, b);
    assert_eq!(a.adjacency(), b.adjacency());
}
