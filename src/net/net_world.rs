//! 网络世界实现
//!
//! 仿真世界：运行期网络 + 已安装的应用。

use super::network::Network;
use crate::app::Apps;
use crate::sim::World;
use std::any::Any;

#[derive(Debug)]
pub struct WanWorld {
    pub net: Network,
    pub apps: Apps,
}

impl WanWorld {
    pub fn new(net: Network) -> Self {
        Self {
            net,
            apps: Apps::default(),
        }
    }

    /// 事件回调里把 `dyn World` 还原成 `WanWorld`。
    pub(crate) fn from_dyn(world: &mut dyn World) -> &mut WanWorld {
        world
            .as_any_mut()
            .downcast_mut::<WanWorld>()
            .expect("world must be WanWorld")
    }
}

impl World for WanWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
