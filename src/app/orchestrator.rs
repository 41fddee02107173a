//! 流编排
//!
//! 给选定场景装好应用，并按开始时间调度激活、按结束时间调度停用。
//! 同一时刻的事件先停用后激活，同类事件按声明顺序（流在前、ping 在后）：
//! 排序是稳定的，仿真器对同一时刻的事件按调度先后执行。
//! 这里不再做任何校验，场景在注册时已经校验过。

use tracing::info;

use super::{AppAction, AppRef};
use crate::net::WanWorld;
use crate::scenario::ValidatedScenario;
use crate::sim::{Event, SimTime, Simulator, World};

pub struct FlowOrchestrator;

impl FlowOrchestrator {
    /// 安装并调度，返回调度的激活/停用事件数
    #[tracing::instrument(skip_all, fields(scenario = %scenario.name()))]
    pub fn schedule(
        scenario: &ValidatedScenario,
        world: &mut WanWorld,
        sim: &mut Simulator,
    ) -> usize {
        world.apps.install(scenario);

        // 时间窗是 [start, stop)：前后相接的两条流在同一端口上交接
        let mut events: Vec<(SimTime, AppAction, AppRef)> = Vec::new();
        for f in scenario.flows() {
            events.push((f.spec.start, AppAction::Activated, AppRef::Flow(f.index)));
            events.push((f.spec.stop, AppAction::Deactivated, AppRef::Flow(f.index)));
        }
        for p in scenario.pings() {
            events.push((p.spec.start, AppAction::Activated, AppRef::Ping(p.index)));
            events.push((p.spec.stop, AppAction::Deactivated, AppRef::Ping(p.index)));
        }
        events.sort_by_key(|&(at, action, _)| (at, action == AppAction::Activated));

        let scheduled = events.len();
        for (at, action, app) in events {
            match action {
                AppAction::Activated => sim.schedule(at, StartApp { app }),
                AppAction::Deactivated => sim.schedule(at, StopApp { app }),
            }
        }
        info!(
            flows = scenario.flows().len(),
            pings = scenario.pings().len(),
            events = scheduled,
            "🗓️  流量调度完成"
        );
        scheduled
    }
}

/// 事件：激活一个应用
#[derive(Debug)]
pub struct StartApp {
    pub app: AppRef,
}

impl Event for StartApp {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = WanWorld::from_dyn(world);
        w.apps.start(self.app, sim, &mut w.net);
    }
}

/// 事件：停用一个应用
#[derive(Debug)]
pub struct StopApp {
    pub app: AppRef,
}

impl Event for StopApp {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        WanWorld::from_dyn(world).apps.stop(self.app, sim);
    }
}
