//! 队列配置
//!
//! 按链路类别给每条链路挂一个排队策略。策略在构建期确定：
//! 重复挂同样的策略是 no-op，挂不同的策略报错。

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::builder::{LinkClass, Topology};
use crate::error::QueueError;
use crate::net::LinkId;
use crate::queue::QueueSpec;

/// 链路类别 -> 排队策略
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueClassMap {
    pub backbone: QueueSpec,
    pub regional: QueueSpec,
    pub access: QueueSpec,
}

impl Default for QueueClassMap {
    /// 设备队列一律 1 包尾丢弃；骨干链路另加 RED（25 包）。
    fn default() -> Self {
        Self {
            backbone: QueueSpec::red(25),
            regional: QueueSpec::drop_tail(1),
            access: QueueSpec::drop_tail(1),
        }
    }
}

impl QueueClassMap {
    pub fn spec_for(&self, class: LinkClass) -> QueueSpec {
        match class {
            LinkClass::Backbone => self.backbone,
            LinkClass::Regional => self.regional,
            LinkClass::Access => self.access,
        }
    }
}

/// 队列配置器：构建期可变，`finish` 后得到只读的 `QueuePlan`。
#[derive(Debug)]
pub struct QueueConfigurator {
    names: Vec<String>,
    attached: Vec<Option<QueueSpec>>,
}

impl QueueConfigurator {
    pub fn new(topo: &Topology) -> Self {
        Self {
            names: topo.links().iter().map(|l| l.name.clone()).collect(),
            attached: vec![None; topo.links().len()],
        }
    }

    /// 按类别映射给所有链路挂队列
    #[tracing::instrument(skip_all)]
    pub fn configure(&mut self, topo: &Topology, map: &QueueClassMap) -> Result<(), QueueError> {
        for link in topo.links() {
            self.attach(link.id, map.spec_for(link.class))?;
        }
        info!(links = self.attached.len(), "🚦 队列配置完成");
        Ok(())
    }

    /// 给单条链路挂队列
    pub fn attach(&mut self, link: LinkId, spec: QueueSpec) -> Result<(), QueueError> {
        let name = &self.names[link.0];
        if spec.capacity_pkts == 0 {
            return Err(QueueError::ZeroCapacity { link: name.clone() });
        }
        match self.attached[link.0] {
            Some(current) if current == spec => {
                debug!(link = %name, "队列已存在且相同，跳过");
                Ok(())
            }
            Some(current) => Err(QueueError::Reconfiguration {
                link: name.clone(),
                current,
                requested: spec,
            }),
            None => {
                debug!(link = %name, ?spec, "挂载队列");
                self.attached[link.0] = Some(spec);
                Ok(())
            }
        }
    }

    pub fn attached(&self, link: LinkId) -> Option<&QueueSpec> {
        self.attached[link.0].as_ref()
    }

    pub fn finish(self) -> Result<QueuePlan, QueueError> {
        let mut specs = Vec::with_capacity(self.attached.len());
        for (name, spec) in self.names.into_iter().zip(self.attached) {
            specs.push(spec.ok_or(QueueError::Unconfigured { link: name })?);
        }
        Ok(QueuePlan { specs })
    }
}

/// 队列配置结果（只读，按 LinkId 下标）
#[derive(Debug, Clone, PartialEq)]
pub struct QueuePlan {
    specs: Vec<QueueSpec>,
}

impl QueuePlan {
    pub fn spec(&self, link: LinkId) -> &QueueSpec {
        &self.specs[link.0]
    }

    pub fn specs(&self) -> &[QueueSpec] {
        &self.specs
    }
}
