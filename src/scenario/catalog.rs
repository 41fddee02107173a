//! 内置场景目录
//!
//! `padrao` 是最小运行：两条 UDP 流 + 一个 ping，跑 11 秒。
//! `simulacao_01` .. `simulacao_08` 是场景驱动的批量实验：200 秒，流只在前 60 秒活跃。

use super::flow::{FlowSpec, PingSpec};
use super::registry::Scenario;
use crate::config::{
    DEFAULT_SCENARIO, DEFAULT_STATS_FILE, MINIMAL_HORIZON, SCENARIO_HORIZON, SCENARIO_WINDOW,
};
use crate::net::DataRate;
use crate::sim::SimTime;

/// 默认场景
pub fn padrao() -> Scenario {
    let rate = DataRate::from_kbps(4000);
    let stop = SimTime::from_secs(10);
    Scenario::new(DEFAULT_SCENARIO, DEFAULT_STATS_FILE, MINIMAL_HORIZON)
        .flow(
            FlowSpec::udp("G1", "G2", 9)
                .via("G1_G2")
                .rate(rate)
                .packet_bytes(210)
                .window(SimTime::from_secs(1), stop),
        )
        .flow(
            FlowSpec::udp("G1", "G3", 9)
                .via("G2_G3")
                .rate(rate)
                .packet_bytes(210)
                .window(SimTime::from_millis(1100), stop),
        )
        .ping(
            PingSpec::new("S4", "L1")
                .via("S1_L1")
                .window(SimTime::from_secs(1), stop)
                .verbose(true),
        )
}

fn simulacao(n: u8, flows: Vec<FlowSpec>) -> Scenario {
    let name = format!("simulacao_{n:02}");
    let output = format!("{name}.xml");
    flows.into_iter().fold(
        Scenario::new(&name, &output, SCENARIO_HORIZON),
        |s, f| s.flow(f.window(SimTime::ZERO, SCENARIO_WINDOW)),
    )
}

/// 场景驱动的实验组
pub fn simulacoes() -> Vec<Scenario> {
    use FlowSpec as F;
    vec![
        simulacao(1, vec![F::udp("N1", "S1", 9)]),
        simulacao(2, vec![F::udp("N1", "S1", 10), F::udp("N4", "S2", 11)]),
        simulacao(3, vec![F::tcp("N1", "S1", 12), F::tcp("N7", "S4", 13)]),
        simulacao(
            4,
            vec![
                F::udp("S1", "N1", 20),
                F::udp("S2", "N4", 21),
                F::udp("S3", "N7", 22),
            ],
        ),
        simulacao(5, vec![F::tcp("S4", "N8", 30), F::udp("N5", "S3", 31)]),
        simulacao(
            6,
            vec![
                F::udp("N1", "N8", 40),
                F::udp("N2", "N8", 41),
                F::tcp("N3", "N6", 42),
            ],
        ),
        simulacao(
            7,
            vec![
                F::udp("G1", "N1", 50),
                F::tcp("S1", "N2", 51),
                F::udp("N6", "S4", 52).rate(DataRate::from_kbps(448)),
            ],
        ),
        simulacao(
            8,
            vec![
                F::udp("N1", "N3", 53),
                F::udp("S1", "S2", 54),
                F::tcp("N2", "S3", 55),
            ],
        ),
    ]
}

/// 全部内置场景（注册顺序）
pub fn builtin() -> Vec<Scenario> {
    let mut all = vec![padrao()];
    all.extend(simulacoes());
    all
}
