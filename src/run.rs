//! 运行流水线
//!
//! 一次运行严格按阶段前进：
//!
//! ```text
//! Building -> Addressed -> QueueConfigured -> Routed -> ScenarioSelected
//!          -> Scheduled -> Running -> Completed -> Serialized
//! ```
//!
//! 任何阶段出错都转到 `Aborted`。阶段不可重入，`Serialized`/`Aborted` 为终态。

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info};

use crate::app::FlowOrchestrator;
use crate::config::RunConfig;
use crate::error::{Error, PhaseError, Result};
use crate::net::{Network, RoutingTable, Stats, WanWorld};
use crate::scenario::{ScenarioFile, ScenarioRegistry, catalog};
use crate::sim::{SimTime, Simulator};
use crate::stats::{StatsCollector, StatsReport};
use crate::topo::{
    AddressAllocator, AddressPlan, QueueClassMap, QueueConfigurator, QueuePlan, RoutingActivator,
    Topology, wan,
};
use crate::trace::AsciiTrace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Building,
    Addressed,
    QueueConfigured,
    Routed,
    ScenarioSelected,
    Scheduled,
    Running,
    Completed,
    Serialized,
    Aborted,
}

impl RunPhase {
    /// 唯一合法的下一阶段（不含 Aborted）
    pub fn successor(self) -> Option<RunPhase> {
        use RunPhase::*;
        match self {
            Building => Some(Addressed),
            Addressed => Some(QueueConfigured),
            QueueConfigured => Some(Routed),
            Routed => Some(ScenarioSelected),
            ScenarioSelected => Some(Scheduled),
            Scheduled => Some(Running),
            Running => Some(Completed),
            Completed => Some(Serialized),
            Serialized | Aborted => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Serialized | RunPhase::Aborted)
    }
}

/// 运行状态机
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    history: Vec<RunPhase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            history: vec![RunPhase::Building],
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        self.history
            .last()
            .copied()
            .unwrap_or(RunPhase::Building)
    }

    /// 经过的所有阶段
    pub fn history(&self) -> &[RunPhase] {
        &self.history
    }

    /// 只接受紧接着的下一阶段
    pub fn advance(&mut self, to: RunPhase) -> Result<(), PhaseError> {
        let from = self.phase();
        if from.successor() != Some(to) {
            return Err(PhaseError { from, to });
        }
        info!(?from, ?to, "阶段切换");
        self.history.push(to);
        Ok(())
    }

    /// 任意非终态都可以中止
    pub fn abort(&mut self) -> Result<(), PhaseError> {
        let from = self.phase();
        if from.is_terminal() {
            return Err(PhaseError {
                from,
                to: RunPhase::Aborted,
            });
        }
        self.history.push(RunPhase::Aborted);
        Ok(())
    }
}

/// 构建期四步的产物（全部只读）
#[derive(Debug, Clone, PartialEq)]
pub struct Fabric {
    pub topo: Topology,
    pub addrs: AddressPlan,
    pub queues: QueuePlan,
    pub routes: RoutingTable,
}

/// 构建 WAN：拓扑 -> 地址 -> 队列 -> 路由
pub fn build_fabric(queue_map: &QueueClassMap, lc: &mut Lifecycle) -> Result<Fabric> {
    let topo = wan::build_wan()?;
    let addrs = AddressAllocator::allocate(&topo, &wan::wan_ledger())?;
    lc.advance(RunPhase::Addressed)?;

    let mut qc = QueueConfigurator::new(&topo);
    qc.configure(&topo, queue_map)?;
    let queues = qc.finish()?;
    lc.advance(RunPhase::QueueConfigured)?;

    let mut activator = RoutingActivator::new();
    activator.activate(&topo, &addrs, &queues)?;
    let routes = activator.into_routes().unwrap_or_default();
    lc.advance(RunPhase::Routed)?;

    Ok(Fabric {
        topo,
        addrs,
        queues,
        routes,
    })
}

/// 内置目录 + 可选场景文件
pub fn build_registry(cfg: &RunConfig, fabric: &Fabric) -> Result<ScenarioRegistry> {
    let mut registry = ScenarioRegistry::new();
    registry.register_all(&fabric.topo, &fabric.addrs, catalog::builtin())?;
    if let Some(path) = &cfg.scenario_file {
        let file = ScenarioFile::load(path)?;
        registry.register_all(&fabric.topo, &fabric.addrs, file.scenarios)?;
    }
    Ok(registry)
}

/// 场景一览（`--list`）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub output: String,
    #[serde(with = "crate::sim::secs")]
    pub horizon: SimTime,
    pub flows: Vec<String>,
    pub pings: Vec<String>,
}

pub fn list_scenarios(cfg: &RunConfig) -> Result<Vec<ScenarioSummary>> {
    let fabric = build_fabric(&cfg.queues, &mut Lifecycle::new())?;
    let registry = build_registry(cfg, &fabric)?;
    Ok(registry
        .names()
        .filter_map(|name| registry.get(name))
        .map(|s| ScenarioSummary {
            name: s.name().to_string(),
            output: s.output().to_string(),
            horizon: s.horizon(),
            flows: s.flows().iter().map(|f| f.spec.label()).collect(),
            pings: s.pings().iter().map(|p| p.spec.label()).collect(),
        })
        .collect())
}

/// 一次运行的结果
#[derive(Debug)]
pub struct RunOutcome {
    pub scenario: String,
    pub phases: Vec<RunPhase>,
    pub events: u64,
    pub final_time: SimTime,
    pub network: Stats,
    pub report: Option<StatsReport>,
    pub stats_file: Option<PathBuf>,
    pub trace_file: Option<PathBuf>,
}

/// 跑完整条流水线；任何错误都让状态机进入 Aborted，
/// 返回 `Error::Aborted`，里面带着经过的阶段和原始错误。
#[tracing::instrument(skip_all, fields(scenario = %cfg.scenario))]
pub fn run(cfg: &RunConfig) -> Result<RunOutcome> {
    let mut lc = Lifecycle::new();
    match pipeline(cfg, &mut lc) {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            let phase = lc.phase();
            if let Err(pe) = lc.abort() {
                error!(error = %pe, "终态不能再中止");
            }
            error!(?phase, error = %e, "运行中止");
            Err(Error::Aborted {
                at: phase,
                phases: lc.history().to_vec(),
                source: Box::new(e),
            })
        }
    }
}

fn pipeline(cfg: &RunConfig, lc: &mut Lifecycle) -> Result<RunOutcome> {
    let fabric = build_fabric(&cfg.queues, lc)?;

    let registry = build_registry(cfg, &fabric)?;
    let scenario = registry.select(&cfg.scenario)?;
    lc.advance(RunPhase::ScenarioSelected)?;

    let Fabric {
        topo,
        addrs,
        queues,
        routes,
    } = &fabric;
    let mut net = Network::new(topo, addrs, queues, routes.clone());
    if cfg.enable_trace {
        net.trace = Some(AsciiTrace::new());
    }
    let mut world = WanWorld::new(net);
    let mut sim = Simulator::default();
    let collector = StatsCollector::new(cfg.enable_monitor);
    collector.install(topo, &mut world);
    FlowOrchestrator::schedule(scenario, &mut world, &mut sim);
    lc.advance(RunPhase::Scheduled)?;

    lc.advance(RunPhase::Running)?;
    collector.drive(scenario.horizon(), &mut sim, &mut world);
    lc.advance(RunPhase::Completed)?;

    let report = collector.report(scenario, &sim, &world);
    let needs_dir = report.is_some() || world.net.trace.is_some();
    if needs_dir {
        fs::create_dir_all(&cfg.out_dir).map_err(|source| Error::Io {
            path: cfg.out_dir.clone(),
            source,
        })?;
    }
    let stats_file = match &report {
        Some(r) => {
            let path = cfg.stats_path(scenario.output());
            // 输出名可以带子目录（注册时已保证不会跳出输出目录）
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| Error::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            collector.serialize(r, &path)?;
            Some(path)
        }
        None => None,
    };
    let trace_file = match &world.net.trace {
        Some(tr) => {
            let path = cfg.trace_path();
            tr.write(&path)?;
            info!(path = %path.display(), lines = tr.len(), "📝 trace 已写出");
            Some(path)
        }
        None => None,
    };
    lc.advance(RunPhase::Serialized)?;

    Ok(RunOutcome {
        scenario: scenario.name().to_string(),
        phases: lc.history().to_vec(),
        events: sim.executed(),
        final_time: sim.now(),
        network: world.net.stats.clone(),
        report,
        stats_file,
        trace_file,
    })
}
