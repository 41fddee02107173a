//! 错误类型
//!
//! 每个构建阶段一个错误枚举；它们都是静态配置缺陷，不重试，直接中止本次运行。
//! 报错信息里带上出问题的名字/地址/端口，不需要重跑就能定位。

use std::net::Ipv4Addr;
use std::path::PathBuf;

use crate::queue::QueueSpec;
use crate::run::RunPhase;
use crate::sim::SimTime;

/// 拓扑构建错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("duplicate node `{name}`")]
    DuplicateNode { name: String },
    #[error("duplicate link {from} -> {to} (declared as `{first}` and `{second}`)")]
    DuplicateLink {
        from: String,
        to: String,
        first: String,
        second: String,
    },
    #[error("duplicate link name `{name}`")]
    DuplicateLinkName { name: String },
    #[error("link `{link}` references unknown node `{node}`")]
    UnknownNode { link: String, node: String },
    #[error("link `{link}` connects node `{node}` to itself")]
    SelfLoop { link: String, node: String },
}

/// 地址分配错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddressError {
    #[error("address conflict: {base}/24 assigned to both `{first}` and `{second}`")]
    Conflict {
        base: Ipv4Addr,
        first: String,
        second: String,
    },
    #[error("link `{link}` has no address ledger entry")]
    Missing { link: String },
    #[error("address ledger names unknown link `{link}`")]
    UnknownLink { link: String },
    #[error("link `{link}` appears more than once in the address ledger")]
    DuplicateEntry { link: String },
    #[error("base {base} for link `{link}` is not a /24 network address")]
    Misaligned { link: String, base: Ipv4Addr },
}

/// 队列配置错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error("link `{link}` already has queue {current:?}, refusing to reconfigure to {requested:?}")]
    Reconfiguration {
        link: String,
        current: QueueSpec,
        requested: QueueSpec,
    },
    #[error("queue for link `{link}` must hold at least one packet")]
    ZeroCapacity { link: String },
    #[error("link `{link}` has no queue attached")]
    Unconfigured { link: String },
}

/// 路由计算失败（拓扑不连通）
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("routing failed: nodes unreachable from `{from}`: {}", .unreachable.join(", "))]
pub struct RoutingError {
    pub from: String,
    pub unreachable: Vec<String>,
}

/// 场景注册/选择错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario `{scenario}`: unknown endpoint `{name}` in {item}")]
    UnknownEndpoint {
        scenario: String,
        item: String,
        name: String,
    },
    #[error("scenario `{scenario}`: `{node}` is not an endpoint of link `{link}` ({item})")]
    NotOnLink {
        scenario: String,
        item: String,
        node: String,
        link: String,
    },
    #[error(
        "scenario `{scenario}`: port collision on {node}:{port} between {first} and {second}"
    )]
    PortCollision {
        scenario: String,
        node: String,
        port: u16,
        first: String,
        second: String,
    },
    #[error("scenario `{scenario}`: {item} uses invalid port 0")]
    InvalidPort { scenario: String, item: String },
    #[error("scenario `{scenario}`: {item} starts at {start} but stops at {stop}")]
    InvalidWindow {
        scenario: String,
        item: String,
        start: SimTime,
        stop: SimTime,
    },
    #[error("scenario `{scenario}`: {item} needs a non-zero {what}")]
    ZeroValue {
        scenario: String,
        item: String,
        what: &'static str,
    },
    #[error("scenario `{scenario}`: {item} outlives the simulation horizon {horizon}")]
    BeyondHorizon {
        scenario: String,
        item: String,
        horizon: SimTime,
    },
    #[error("scenario `{scenario}`: output `{output}` must be a plain file name under the output directory")]
    InvalidOutput { scenario: String, output: String },
    #[error("scenario `{name}` is already registered")]
    Duplicate { name: String },
    #[error("unknown scenario `{name}` (known: {})", .known.join(", "))]
    Unknown { name: String, known: Vec<String> },
}

/// 运行状态机错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid run phase transition {from:?} -> {to:?}")]
pub struct PhaseError {
    pub from: RunPhase,
    pub to: RunPhase,
}

/// 顶层错误
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: unsupported scenario file schema_version {found}", .path.display())]
    Schema { path: PathBuf, found: u32 },
    /// 运行中止：带上中止前经过的阶段
    #[error("run aborted in {at:?}: {source}")]
    Aborted {
        at: RunPhase,
        phases: Vec<RunPhase>,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// 剥掉 `Aborted` 外壳后的原始错误
    pub fn root(&self) -> &Error {
        match self {
            Error::Aborted { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
