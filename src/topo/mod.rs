//! 拓扑、地址与队列
//!
//! 构建期的四个步骤，严格按顺序交接，每步产出只读结果：
//! `TopologyBuilder` -> `AddressAllocator` -> `QueueConfigurator` -> `RoutingActivator`。

mod address;
mod builder;
mod queue_config;
mod routing;
pub mod wan;

pub use address::{AddressAllocator, AddressLedger, AddressPlan, SUBNET_PREFIX_LEN, Subnet};
pub use builder::{
    Link, LinkClass, LinkDecl, Node, NodeDecl, Region, Topology, TopologyBuilder,
};
pub use queue_config::{QueueClassMap, QueueConfigurator, QueuePlan};
pub use routing::RoutingActivator;
