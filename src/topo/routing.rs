//! 路由激活
//!
//! 地址与队列都定下来之后触发一次全局路由计算。重复调用直接返回已有结果。

use tracing::{info, warn};

use super::address::AddressPlan;
use super::builder::Topology;
use super::queue_config::QueuePlan;
use crate::error::RoutingError;
use crate::net::{NodeId, RoutingTable};

#[derive(Debug, Default)]
pub struct RoutingActivator {
    routes: Option<RoutingTable>,
}

impl RoutingActivator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_computed(&self) -> bool {
        self.routes.is_some()
    }

    /// 计算全局路由。`_addrs`/`_queues` 只是前置阶段已完成的凭证。
    #[tracing::instrument(skip_all)]
    pub fn activate(
        &mut self,
        topo: &Topology,
        _addrs: &AddressPlan,
        _queues: &QueuePlan,
    ) -> Result<&RoutingTable, RoutingError> {
        if self.routes.is_some() {
            warn!("路由已计算，忽略重复调用");
        } else {
            let table = RoutingTable::build(&topo.adjacency());
            if let Some(first) = topo.nodes().first() {
                let unreachable = table.unreachable_from(first.id);
                if !unreachable.is_empty() {
                    return Err(RoutingError {
                        from: first.name.clone(),
                        unreachable: unreachable
                            .into_iter()
                            .map(|n: NodeId| topo.node_name(n).to_string())
                            .collect(),
                    });
                }
            }
            info!(nodes = table.node_count(), "🧭 全局路由计算完成");
            self.routes = Some(table);
        }
        Ok(self.routes.get_or_insert_with(RoutingTable::default))
    }

    /// 取出路由表交给网络引擎
    pub fn into_routes(self) -> Option<RoutingTable> {
        self.routes
    }
}
