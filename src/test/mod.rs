mod packet;
mod scenario_registry;
mod simulator;
mod stats;
mod topologies;

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::net::{Network, WanWorld};
use crate::run::{Fabric, Lifecycle, build_fabric};
use crate::topo::QueueClassMap;

/// 默认队列配置下的 WAN
pub(crate) fn wan_fabric() -> Fabric {
    build_fabric(&QueueClassMap::default(), &mut Lifecycle::new()).expect("build wan")
}

pub(crate) fn wan_world(fabric: &Fabric) -> WanWorld {
    WanWorld::new(Network::new(
        &fabric.topo,
        &fabric.addrs,
        &fabric.queues,
        fabric.routes.clone(),
    ))
}

pub(crate) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "wansim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
