use std::error::Error;

use clap::ArgMatches;
use log::debug;
use tricut_lib::analysis::AnalyzerConfig;
use tricut_lib::ChainSettings;

use crate::cli;

pub fn run(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    match args.subcommand() {
        Some(("render", sub)) => cli::render::run_render(sub),
        Some(("response", sub)) => run_response(sub),
        Some(("analyze", sub)) => cli::analyze::run_analyze(sub),
        Some(("bench", sub)) => cli::bench::run_bench(sub),
        Some(("create", sub)) => run_create(sub),
        _ => {
            cli::args::build_cli().print_help()?;
            Ok(2)
        }
    }
}

fn run_response(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    let settings = cli::render::load_settings(args)?;
    let sample_rate = args.get_one::<f64>("sample-rate").copied().unwrap_or(48_000.0);
    let points = args.get_one::<usize>("points").copied().unwrap_or(200);
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(format!("invalid sample rate {}", sample_rate).into());
    }
    debug!("response: {} points at {} Hz", points, sample_rate);

    let curve = tricut_lib::analysis::response_points(&settings, sample_rate, points);
    println!("{}", serde_json::to_string_pretty(&curve)?);
    Ok(0)
}

fn run_create(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    let json = match args.subcommand() {
        Some(("settings-json", _)) => serde_json::to_string_pretty(&ChainSettings::default())?,
        Some(("analyzer-json", _)) => serde_json::to_string_pretty(&AnalyzerConfig::default())?,
        _ => return Err("unknown create target".into()),
    };
    println!("{}", json);
    Ok(0)
}
