//! 仿真核心模块
//!
//! 事件驱动的离散仿真内核：仿真时间、事件、世界和仿真器。
//! 上层（拓扑/场景/统计）只负责配置并驱动它。

mod event;
mod simulator;
mod time;

pub use event::{Event, World};
pub use simulator::Simulator;
pub use time::{SimTime, secs};
