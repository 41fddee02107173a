use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use wansim_rs::config::{DEFAULT_SCENARIO, RunConfig};
use wansim_rs::run::{list_scenarios, run};

#[derive(Debug, Parser)]
#[command(
    name = "wan-sim",
    about = "Three-region WAN simulation (global backbone + South/North America access)"
)]
struct Args {
    /// Scenario to run
    #[arg(long, default_value = DEFAULT_SCENARIO)]
    scenario: String,

    /// Enable FlowMonitor statistics output
    #[arg(long = "EnableMonitor", default_value_t = true, action = ArgAction::Set)]
    enable_monitor: bool,

    /// Enable ASCII event trace output
    #[arg(long = "EnableTrace", default_value_t = true, action = ArgAction::Set)]
    enable_trace: bool,

    /// Directory for the stats and trace files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Extra scenarios (JSON), registered after the built-in catalog
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// List registered scenarios as JSON and exit
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = RunConfig {
        scenario: args.scenario,
        enable_monitor: args.enable_monitor,
        enable_trace: args.enable_trace,
        out_dir: args.out_dir,
        scenario_file: args.scenarios,
        ..RunConfig::default()
    };

    if args.list {
        return match list_scenarios(&cfg) {
            Ok(list) => match serde_json::to_string_pretty(&list) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match run(&cfg) {
        Ok(outcome) => {
            let n = &outcome.network;
            println!(
                "scenario={} events={} sent={} delivered={} dropped={}",
                outcome.scenario, outcome.events, n.sent_pkts, n.delivered_pkts, n.dropped_pkts
            );
            if let Some(path) = &outcome.stats_file {
                println!("stats: {}", path.display());
            }
            if let Some(path) = &outcome.trace_file {
                println!("trace: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
