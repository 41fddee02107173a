use std::fs;
use std::net::Ipv4Addr;

use super::{unique_temp_dir, wan_fabric};
use crate::config::{DEFAULT_STATS_FILE, SCENARIO_HORIZON};
use crate::error::{Error, ScenarioError};
use crate::net::DataRate;
use crate::scenario::{
    FlowSpec, PingSpec, Protocol, SCHEMA_VERSION, Scenario, ScenarioFile, ScenarioRegistry,
    ValidatedScenario, catalog,
};
use crate::sim::SimTime;

fn window_60(f: FlowSpec) -> FlowSpec {
    f.window(SimTime::ZERO, SimTime::from_secs(60))
}

fn scenario(flows: Vec<FlowSpec>) -> Scenario {
    flows.into_iter().fold(
        Scenario::new("custom", "custom.json", SCENARIO_HORIZON),
        |s, f| s.flow(f),
    )
}

#[test]
fn three_distinct_ports_are_accepted() {
    let fabric = wan_fabric();
    let s = scenario(vec![
        window_60(FlowSpec::udp("N1", "N3", 53)),
        window_60(FlowSpec::udp("S1", "S2", 54)),
        window_60(FlowSpec::tcp("N2", "S3", 55)),
    ]);
    let v = ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s).expect("valid");

    assert_eq!(v.flows().len(), 3);
    let f = &v.flows()[0];
    assert_eq!(f.index, 0);
    assert_eq!(f.src, fabric.topo.lookup("N1").expect("N1"));
    assert_eq!(f.dst, fabric.topo.lookup("N3").expect("N3"));
    assert_eq!(f.dst_addr, Ipv4Addr::new(10, 1, 9, 1));
    assert_eq!(v.flows()[2].spec.protocol, Protocol::Tcp);
    assert_eq!(v.flows()[2].index, 2);
}

#[test]
fn overlapping_flows_on_one_port_collide() {
    let fabric = wan_fabric();
    let s = scenario(vec![
        window_60(FlowSpec::udp("N1", "N3", 12)),
        window_60(FlowSpec::tcp("N2", "N3", 12)),
    ]);
    let err = ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s).expect_err("collision");
    assert_eq!(
        err,
        ScenarioError::PortCollision {
            scenario: "custom".to_string(),
            node: "N3".to_string(),
            port: 12,
            first: "UDP N1->N3:12".to_string(),
            second: "TCP N2->N3:12".to_string(),
        }
    );
}

#[test]
fn same_port_is_fine_when_windows_or_nodes_differ() {
    let fabric = wan_fabric();
    let s = scenario(vec![
        FlowSpec::udp("N1", "N3", 12).window(SimTime::ZERO, SimTime::from_secs(30)),
        FlowSpec::udp("N2", "N3", 12).window(SimTime::from_secs(30), SimTime::from_secs(60)),
        window_60(FlowSpec::udp("N1", "N4", 12)),
    ]);
    assert!(ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s).is_ok());
}

#[test]
fn output_must_stay_inside_the_output_directory() {
    let fabric = wan_fabric();
    for output in ["../up.json", "/abs.json", "a/../../up.json"] {
        let s = Scenario::new("leaky", output, SCENARIO_HORIZON);
        assert_eq!(
            ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s),
            Err(ScenarioError::InvalidOutput {
                scenario: "leaky".to_string(),
                output: output.to_string(),
            })
        );
    }
    let nested = Scenario::new("nested", "runs/leaky.json", SCENARIO_HORIZON);
    assert!(ValidatedScenario::validate(&fabric.topo, &fabric.addrs, nested).is_ok());
}

#[test]
fn unknown_endpoints_are_rejected() {
    let fabric = wan_fabric();
    let s = scenario(vec![window_60(FlowSpec::udp("N1", "N9", 7))]);
    assert_eq!(
        ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s),
        Err(ScenarioError::UnknownEndpoint {
            scenario: "custom".to_string(),
            item: "UDP N1->N9:7".to_string(),
            name: "N9".to_string(),
        })
    );

    let s = scenario(vec![window_60(FlowSpec::udp("N1", "N3", 7).via("N9_L3"))]);
    assert!(matches!(
        ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s),
        Err(ScenarioError::UnknownEndpoint { ref name, .. }) if name == "N9_L3"
    ));

    let s = scenario(vec![window_60(FlowSpec::udp("N1", "N3", 7).via("N1_L3"))]);
    assert!(matches!(
        ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s),
        Err(ScenarioError::NotOnLink { ref link, .. }) if link == "N1_L3"
    ));
}

#[test]
fn flow_parameters_are_checked_before_endpoints() {
    let fabric = wan_fabric();
    let check = |f: FlowSpec| {
        ValidatedScenario::validate(&fabric.topo, &fabric.addrs, scenario(vec![f]))
            .expect_err("invalid flow")
    };

    assert!(matches!(
        check(window_60(FlowSpec::udp("X", "Y", 0))),
        ScenarioError::InvalidPort { .. }
    ));
    assert!(matches!(
        check(window_60(FlowSpec::udp("N1", "N3", 9)).rate(DataRate(0))),
        ScenarioError::ZeroValue { what: "rate", .. }
    ));
    assert!(matches!(
        check(window_60(FlowSpec::udp("N1", "N3", 9)).packet_bytes(0)),
        ScenarioError::ZeroValue {
            what: "packet size",
            ..
        }
    ));
    assert!(matches!(
        check(FlowSpec::udp("N1", "N3", 9).window(SimTime::from_secs(5), SimTime::from_secs(5))),
        ScenarioError::InvalidWindow { .. }
    ));
    assert!(matches!(
        check(FlowSpec::udp("N1", "N3", 9).window(SimTime::ZERO, SimTime::from_secs(201))),
        ScenarioError::BeyondHorizon { .. }
    ));
}

#[test]
fn pings_are_validated_too() {
    let fabric = wan_fabric();
    let mut ping = PingSpec::new("S4", "L1").via("S1_L1");
    ping.interval = SimTime::ZERO;
    let s = Scenario::new("p", "p.json", SCENARIO_HORIZON).ping(ping);
    assert!(matches!(
        ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s),
        Err(ScenarioError::ZeroValue {
            what: "interval",
            ..
        })
    ));

    let s = Scenario::new("p", "p.json", SCENARIO_HORIZON)
        .ping(PingSpec::new("S4", "L1").via("S1_L1"));
    let v = ValidatedScenario::validate(&fabric.topo, &fabric.addrs, s).expect("valid ping");
    assert_eq!(v.pings()[0].dst_addr, Ipv4Addr::new(10, 55, 4, 2));
}

#[test]
fn builtin_catalog_registers_cleanly() {
    let fabric = wan_fabric();
    let mut registry = ScenarioRegistry::new();
    registry
        .register_all(&fabric.topo, &fabric.addrs, catalog::builtin())
        .expect("builtin");
    assert_eq!(registry.len(), 9);
    let names: Vec<_> = registry.names().collect();
    assert_eq!(names[0], "padrao");
    assert_eq!(names[8], "simulacao_08");

    let padrao = registry.get("padrao").expect("padrao");
    assert_eq!(padrao.output(), DEFAULT_STATS_FILE);
    assert_eq!(padrao.horizon(), SimTime::from_secs(11));
    assert_eq!(padrao.flows()[0].dst_addr, Ipv4Addr::new(10, 0, 1, 2));
    assert_eq!(padrao.flows()[1].dst_addr, Ipv4Addr::new(10, 0, 2, 2));
    assert_eq!(padrao.pings().len(), 1);

    let s8 = registry.get("simulacao_08").expect("simulacao_08");
    assert_eq!(s8.output(), "simulacao_08.xml");
    let labels: Vec<_> = s8.flows().iter().map(|f| f.spec.label()).collect();
    assert_eq!(labels, ["UDP N1->N3:53", "UDP S1->S2:54", "TCP N2->S3:55"]);
}

#[test]
fn duplicate_and_unknown_names_are_rejected() {
    let fabric = wan_fabric();
    let mut registry = ScenarioRegistry::new();
    assert!(registry.is_empty());
    registry
        .register(&fabric.topo, &fabric.addrs, catalog::padrao())
        .expect("padrao");
    assert_eq!(
        registry.register(&fabric.topo, &fabric.addrs, catalog::padrao()),
        Err(ScenarioError::Duplicate {
            name: "padrao".to_string()
        })
    );
    assert_eq!(
        registry.select("simulacao_99").map(|s| s.name()),
        Err(ScenarioError::Unknown {
            name: "simulacao_99".to_string(),
            known: vec!["padrao".to_string()],
        })
    );
}

#[test]
fn selecting_a_scenario_leaves_the_fabric_untouched() {
    let fabric = wan_fabric();
    let before = fabric.clone();
    let mut registry = ScenarioRegistry::new();
    registry
        .register_all(&fabric.topo, &fabric.addrs, catalog::builtin())
        .expect("builtin");

    let a = registry.select("simulacao_03").expect("03");
    let b = registry.select("simulacao_08").expect("08");
    assert_ne!(a.output(), b.output());
    assert_ne!(a.flows(), b.flows());
    assert_eq!(fabric, before);
    assert_eq!(fabric, wan_fabric());
}

#[test]
fn scenario_file_loads_and_checks_version() {
    let dir = unique_temp_dir("scenario-file");
    let path = dir.join("extra.json");

    let file = ScenarioFile::new(vec![
        Scenario::new("extra", "extra.json", SimTime::from_secs(5))
            .flow(FlowSpec::udp("N1", "N2", 80).window(SimTime::ZERO, SimTime::from_secs(2))),
    ]);
    fs::write(&path, serde_json::to_string_pretty(&file).expect("json")).expect("write");
    let loaded = ScenarioFile::load(&path).expect("load");
    assert_eq!(loaded, file);
    assert_eq!(loaded.schema_version, SCHEMA_VERSION);

    fs::write(
        &path,
        r#"{ "schema_version": 2, "scenarios": [] }"#,
    )
    .expect("write");
    assert!(matches!(
        ScenarioFile::load(&path),
        Err(Error::Schema { found: 2, .. })
    ));

    fs::write(&path, "{ not json").expect("write");
    assert!(matches!(ScenarioFile::load(&path), Err(Error::Json { .. })));
    assert!(matches!(
        ScenarioFile::load(&dir.join("missing.json")),
        Err(Error::Io { .. })
    ));
}

#[test]
fn scenario_json_accepts_rate_strings_and_defaults() {
    let raw = r#"{
        "name": "json",
        "output": "json.json",
        "horizon": 10,
        "flows": [
            { "protocol": "tcp", "src": "N7", "dst": "S4", "port": 13,
              "rate": "448kbps", "packet_bytes": 512, "start": 0.5, "stop": 9 }
        ]
    }"#;
    let s: Scenario = serde_json::from_str(raw).expect("parse");
    assert!(s.pings.is_empty());
    let f = &s.flows[0];
    assert_eq!(f.protocol, Protocol::Tcp);
    assert_eq!(f.rate, DataRate::from_kbps(448));
    assert_eq!(f.start, SimTime::from_millis(500));
    assert_eq!(f.dst_link, None);
}
