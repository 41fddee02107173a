//! 运行配置
//!
//! 仿真时长、场景活跃窗口与输出文件名在构建期固定，这里集中暴露为常量；
//! 每次运行可变的部分（选哪个场景、开不开 monitor/trace、输出目录）放在 `RunConfig`。

use std::path::PathBuf;

use crate::sim::SimTime;
use crate::topo::QueueClassMap;

/// 最小拓扑运行的仿真时长
pub const MINIMAL_HORIZON: SimTime = SimTime::from_secs(11);
/// 场景驱动运行的仿真时长
pub const SCENARIO_HORIZON: SimTime = SimTime::from_secs(200);
/// 场景驱动运行中流的活跃窗口 `[0, 60s)`
pub const SCENARIO_WINDOW: SimTime = SimTime::from_secs(60);

pub const DEFAULT_SCENARIO: &str = "padrao";
pub const DEFAULT_STATS_FILE: &str = "padrao_simple-global-routing.flowmon";
pub const TRACE_FILE: &str = "simple-global-routing.tr";

/// 单次运行的配置
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub scenario: String,
    pub enable_monitor: bool,
    pub enable_trace: bool,
    pub out_dir: PathBuf,
    /// 额外的场景文件，在内置目录之后注册
    pub scenario_file: Option<PathBuf>,
    pub queues: QueueClassMap,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scenario: DEFAULT_SCENARIO.to_string(),
            enable_monitor: true,
            enable_trace: true,
            out_dir: PathBuf::from("."),
            scenario_file: None,
            queues: QueueClassMap::default(),
        }
    }
}

impl RunConfig {
    pub fn with_scenario(mut self, name: &str) -> Self {
        self.scenario = name.to_string();
        self
    }

    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn stats_path(&self, output: &str) -> PathBuf {
        self.out_dir.join(output)
    }

    pub fn trace_path(&self) -> PathBuf {
        self.out_dir.join(TRACE_FILE)
    }
}
