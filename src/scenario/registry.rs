//! 场景注册表
//!
//! 场景在注册时整体校验：端点能解析、端口合法、时间窗有效、不超出仿真时长，
//! 以及同一 (目的节点, 端口) 上的流时间窗互不重叠。通过校验的场景连同
//! 解析好的节点/地址一起保存，之后按名字选择，编排阶段不再重复校验。

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::flow::{FlowSpec, PingSpec};
use crate::error::ScenarioError;
use crate::net::NodeId;
use crate::sim::SimTime;
use crate::topo::{AddressPlan, Topology};

/// 具名场景：一组流 + ping + 输出文件名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// 统计文件名（相对输出目录）
    pub output: String,
    /// 仿真时长
    #[serde(with = "crate::sim::secs")]
    pub horizon: SimTime,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    #[serde(default)]
    pub pings: Vec<PingSpec>,
}

impl Scenario {
    pub fn new(name: &str, output: &str, horizon: SimTime) -> Self {
        Self {
            name: name.to_string(),
            output: output.to_string(),
            horizon,
            flows: Vec::new(),
            pings: Vec::new(),
        }
    }

    pub fn flow(mut self, flow: FlowSpec) -> Self {
        self.flows.push(flow);
        self
    }

    pub fn ping(mut self, ping: PingSpec) -> Self {
        self.pings.push(ping);
        self
    }
}

/// 解析过端点的流
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFlow {
    /// 在场景声明列表中的下标
    pub index: usize,
    pub spec: FlowSpec,
    pub src: NodeId,
    pub dst: NodeId,
    pub dst_addr: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPing {
    pub index: usize,
    pub spec: PingSpec,
    pub src: NodeId,
    pub dst: NodeId,
    pub dst_addr: Ipv4Addr,
}

/// 通过校验的场景（只读）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedScenario {
    scenario: Scenario,
    flows: Vec<ResolvedFlow>,
    pings: Vec<ResolvedPing>,
}

impl ValidatedScenario {
    /// 校验并解析场景
    pub fn validate(
        topo: &Topology,
        addrs: &AddressPlan,
        scenario: Scenario,
    ) -> Result<Self, ScenarioError> {
        let v = Validator {
            topo,
            addrs,
            scenario: &scenario.name,
        };
        v.check_output(&scenario.output)?;

        let mut flows = Vec::with_capacity(scenario.flows.len());
        for (index, spec) in scenario.flows.iter().enumerate() {
            let item = spec.label();
            if spec.port == 0 {
                return Err(v.err_port(&item));
            }
            if spec.rate.bps() == 0 {
                return Err(v.err_zero(&item, "rate"));
            }
            if spec.packet_bytes == 0 {
                return Err(v.err_zero(&item, "packet size"));
            }
            v.check_window(&item, spec.start, spec.stop, scenario.horizon)?;
            let src = v.node(&item, &spec.src)?;
            let (dst, dst_addr) = v.destination(&item, &spec.dst, spec.dst_link.as_deref())?;
            flows.push(ResolvedFlow {
                index,
                spec: spec.clone(),
                src,
                dst,
                dst_addr,
            });
        }
        v.check_ports(&flows)?;

        let mut pings = Vec::with_capacity(scenario.pings.len());
        for (index, spec) in scenario.pings.iter().enumerate() {
            let item = spec.label();
            if spec.interval == SimTime::ZERO {
                return Err(v.err_zero(&item, "interval"));
            }
            v.check_window(&item, spec.start, spec.stop, scenario.horizon)?;
            let src = v.node(&item, &spec.src)?;
            let (dst, dst_addr) = v.destination(&item, &spec.dst, spec.dst_link.as_deref())?;
            pings.push(ResolvedPing {
                index,
                spec: spec.clone(),
                src,
                dst,
                dst_addr,
            });
        }

        Ok(Self {
            scenario,
            flows,
            pings,
        })
    }

    pub fn name(&self) -> &str {
        &self.scenario.name
    }

    pub fn output(&self) -> &str {
        &self.scenario.output
    }

    pub fn horizon(&self) -> SimTime {
        self.scenario.horizon
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// 按声明顺序
    pub fn flows(&self) -> &[ResolvedFlow] {
        &self.flows
    }

    pub fn pings(&self) -> &[ResolvedPing] {
        &self.pings
    }
}

struct Validator<'a> {
    topo: &'a Topology,
    addrs: &'a AddressPlan,
    scenario: &'a str,
}

impl Validator<'_> {
    fn err_port(&self, item: &str) -> ScenarioError {
        ScenarioError::InvalidPort {
            scenario: self.scenario.to_string(),
            item: item.to_string(),
        }
    }

    fn err_zero(&self, item: &str, what: &'static str) -> ScenarioError {
        ScenarioError::ZeroValue {
            scenario: self.scenario.to_string(),
            item: item.to_string(),
            what,
        }
    }

    /// 输出文件必须落在输出目录里：非空、相对路径、不含 `..`
    fn check_output(&self, output: &str) -> Result<(), ScenarioError> {
        let path = Path::new(output);
        let plain = !output.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(ScenarioError::InvalidOutput {
                scenario: self.scenario.to_string(),
                output: output.to_string(),
            });
        }
        Ok(())
    }

    fn check_window(
        &self,
        item: &str,
        start: SimTime,
        stop: SimTime,
        horizon: SimTime,
    ) -> Result<(), ScenarioError> {
        if start >= stop {
            return Err(ScenarioError::InvalidWindow {
                scenario: self.scenario.to_string(),
                item: item.to_string(),
                start,
                stop,
            });
        }
        if stop > horizon {
            return Err(ScenarioError::BeyondHorizon {
                scenario: self.scenario.to_string(),
                item: item.to_string(),
                horizon,
            });
        }
        Ok(())
    }

    fn node(&self, item: &str, name: &str) -> Result<NodeId, ScenarioError> {
        self.topo
            .lookup(name)
            .ok_or_else(|| ScenarioError::UnknownEndpoint {
                scenario: self.scenario.to_string(),
                item: item.to_string(),
                name: name.to_string(),
            })
    }

    /// 目的节点 + 目的地址。指定了链路时取该链路上的接口，否则取节点第一条链路。
    fn destination(
        &self,
        item: &str,
        name: &str,
        link: Option<&str>,
    ) -> Result<(NodeId, Ipv4Addr), ScenarioError> {
        let node = self.node(item, name)?;
        let addr = match link {
            Some(link_name) => {
                let link = self.topo.lookup_link(link_name).ok_or_else(|| {
                    ScenarioError::UnknownEndpoint {
                        scenario: self.scenario.to_string(),
                        item: item.to_string(),
                        name: link_name.to_string(),
                    }
                })?;
                self.addrs.address_on(self.topo, link, node).ok_or_else(|| {
                    ScenarioError::NotOnLink {
                        scenario: self.scenario.to_string(),
                        item: item.to_string(),
                        node: name.to_string(),
                        link: link_name.to_string(),
                    }
                })?
            }
            // 孤立节点没有地址，按解析失败处理
            None => self
                .addrs
                .addresses_of(self.topo, node)
                .first()
                .copied()
                .ok_or_else(|| ScenarioError::UnknownEndpoint {
                    scenario: self.scenario.to_string(),
                    item: item.to_string(),
                    name: name.to_string(),
                })?,
        };
        Ok((node, addr))
    }

    /// 同一 (目的节点, 端口) 上的流时间窗不得重叠。协议不参与判断。
    fn check_ports(&self, flows: &[ResolvedFlow]) -> Result<(), ScenarioError> {
        let mut by_port: BTreeMap<(NodeId, u16), Vec<&ResolvedFlow>> = BTreeMap::new();
        for f in flows {
            by_port.entry((f.dst, f.spec.port)).or_default().push(f);
        }
        for ((node, port), group) in by_port {
            for (i, a) in group.iter().enumerate() {
                if let Some(b) = group[i + 1..].iter().find(|b| a.spec.overlaps(&b.spec)) {
                    return Err(ScenarioError::PortCollision {
                        scenario: self.scenario.to_string(),
                        node: self.topo.node_name(node).to_string(),
                        port,
                        first: a.spec.label(),
                        second: b.spec.label(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// 场景注册表：名字 -> 已校验场景（保持注册顺序）
#[derive(Debug, Default)]
pub struct ScenarioRegistry {
    scenarios: Vec<ValidatedScenario>,
    index: HashMap<String, usize>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 校验并注册一个场景；重名报错。
    #[tracing::instrument(skip_all, fields(scenario = %scenario.name))]
    pub fn register(
        &mut self,
        topo: &Topology,
        addrs: &AddressPlan,
        scenario: Scenario,
    ) -> Result<(), ScenarioError> {
        if self.index.contains_key(&scenario.name) {
            return Err(ScenarioError::Duplicate {
                name: scenario.name,
            });
        }
        let validated = ValidatedScenario::validate(topo, addrs, scenario)?;
        debug!(
            flows = validated.flows().len(),
            pings = validated.pings().len(),
            horizon = %validated.horizon(),
            "场景已注册"
        );
        self.index
            .insert(validated.name().to_string(), self.scenarios.len());
        self.scenarios.push(validated);
        Ok(())
    }

    pub fn register_all(
        &mut self,
        topo: &Topology,
        addrs: &AddressPlan,
        scenarios: impl IntoIterator<Item = Scenario>,
    ) -> Result<(), ScenarioError> {
        for s in scenarios {
            self.register(topo, addrs, s)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// 注册顺序的场景名
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.scenarios.iter().map(|s| s.name())
    }

    pub fn get(&self, name: &str) -> Option<&ValidatedScenario> {
        self.index.get(name).map(|&i| &self.scenarios[i])
    }

    /// 按名字选出本次运行的场景
    pub fn select(&self, name: &str) -> Result<&ValidatedScenario, ScenarioError> {
        let s = self.get(name).ok_or_else(|| ScenarioError::Unknown {
            name: name.to_string(),
            known: self.names().map(str::to_string).collect(),
        })?;
        info!(
            scenario = %s.name(),
            flows = s.flows().len(),
            pings = s.pings().len(),
            output = %s.output(),
            "🎬 选定场景"
        );
        Ok(s)
    }
}
