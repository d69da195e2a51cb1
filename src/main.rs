use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cellular_traffic::service::{
    serve_lines, serve_tcp, InitRequest, ServiceSettings, SimulationService, DEFAULT_MAX_STEPS,
};

#[derive(Parser)]
#[command(name = "cellular_traffic")]
#[command(about = "Cellular-automaton traffic simulation service")]
struct Cli {
    /// Serve line-delimited JSON over TCP on this address instead of stdin/stdout
    #[arg(long)]
    listen: Option<String>,

    /// Run a scenario to completion without serving requests
    #[arg(long)]
    headless: bool,

    /// Number of simulation ticks to run in headless mode
    #[arg(long, default_value = "1000")]
    ticks: usize,

    /// JSON file holding an init request body for headless mode
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Seed for reproducible simulations
    #[arg(long)]
    seed: Option<u64>,

    /// Largest tick count a single step request may ask for
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,cellular_traffic=info"),
    )
    .init();

    let cli = Cli::parse();
    let service = Arc::new(SimulationService::new(ServiceSettings {
        seed: cli.seed,
        max_steps: cli.max_steps,
    }));

    if cli.headless {
        run_headless(&service, cli.ticks, cli.scenario.as_deref())
    } else if let Some(addr) = &cli.listen {
        serve_tcp(service, addr)
    } else {
        info!("Serving requests on stdin/stdout");
        let stdin = io::stdin();
        let handled = serve_lines(&service, stdin.lock(), io::stdout().lock())?;
        info!("Input closed after {} requests", handled);
        Ok(())
    }
}

/// Scenario used by headless mode when no file is given
fn default_scenario() -> InitRequest {
    InitRequest {
        random_vehicles: true,
        density: Some(0.2),
        max_speed_interval: Some([3, 7]),
        ..InitRequest::default()
    }
}

fn load_scenario(path: &Path) -> Result<InitRequest> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse scenario {}", path.display()))
}

/// Run the simulation in headless mode, logging a summary every report interval
fn run_headless(service: &SimulationService, ticks: usize, scenario: Option<&Path>) -> Result<()> {
    let scenario = match scenario {
        Some(path) => load_scenario(path)?,
        None => default_scenario(),
    };

    info!("Running traffic simulation in headless mode for {} ticks", ticks);
    let snapshot = service.init(scenario.into())?;
    snapshot.log_summary();

    let report_every = (ticks / 10)
        .max(1)
        .min(service.settings().max_steps.max(1));
    let mut tick = 0;
    while tick < ticks {
        let chunk = report_every.min(ticks - tick);
        let snapshot = service.step(chunk)?;
        tick += chunk;
        info!(
            "--- After tick {}: mean speed {:.2}, stopped {} ---",
            snapshot.tick, snapshot.stats.mean_speed, snapshot.stats.stopped
        );
    }

    info!("=== SIMULATION COMPLETE ===");
    service.state()?.log_summary();
    Ok(())
}
