//! 流量场景
//!
//! 流/ping 的定义、内置场景目录、场景文件，以及负责校验与选择的注册表。

pub mod catalog;
mod file;
mod flow;
mod registry;

pub use file::{SCHEMA_VERSION, ScenarioFile};
pub use flow::{FlowSpec, PingSpec, Protocol};
pub use registry::{ResolvedFlow, ResolvedPing, Scenario, ScenarioRegistry, ValidatedScenario};
