//! 统计收集
//!
//! 运行前在所有节点装 FlowMonitor，驱动仿真到场景的截止时间，
//! 结束后把按流统计写到场景指定的文件。monitor 关闭时照常运行，
//! 但不产生统计文件。

mod monitor;
mod report;

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::net::WanWorld;
use crate::scenario::ValidatedScenario;
use crate::sim::{SimTime, Simulator};
use crate::topo::Topology;

pub use monitor::{FiveTuple, FlowId, FlowMonitor, FlowStats};
pub use report::{FlowRecord, StatsReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsCollector {
    enabled: bool,
}

impl StatsCollector {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 在每个节点装 monitor（关闭时什么也不做）
    pub fn install(&self, topo: &Topology, world: &mut WanWorld) {
        if self.enabled {
            world.net.monitor = Some(FlowMonitor::install_all(topo));
            info!(nodes = topo.nodes().len(), "📈 FlowMonitor 已安装");
        } else {
            world.net.monitor = None;
            info!("FlowMonitor 已关闭，不产生统计文件");
        }
    }

    /// 运行到截止时间
    pub fn drive(&self, horizon: SimTime, sim: &mut Simulator, world: &mut WanWorld) {
        sim.run_until(horizon, world);
    }

    /// 汇总报告；monitor 关闭时为 None
    pub fn report(
        &self,
        scenario: &ValidatedScenario,
        sim: &Simulator,
        world: &WanWorld,
    ) -> Option<StatsReport> {
        let monitor = world.net.monitor.as_ref()?;
        Some(StatsReport {
            scenario: scenario.name().to_string(),
            horizon: scenario.horizon(),
            events: sim.executed(),
            network: world.net.stats.clone(),
            flows: StatsReport::flow_records(monitor),
            senders: world.apps.sender_reports(),
            pings: world.apps.ping_reports(),
            activations: world.apps.activations().to_vec(),
        })
    }

    /// 写统计文件
    #[tracing::instrument(skip(self, report), fields(path = %path.display()))]
    pub fn serialize(&self, report: &StatsReport, path: &Path) -> Result<()> {
        report.write(path)?;
        info!(flows = report.flows.len(), "💾 统计已写出");
        Ok(())
    }
}
