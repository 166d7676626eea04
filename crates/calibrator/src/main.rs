//! Misinformation Diffusion Calibrator
//!
//! Command line entry point: picks the network topology and run title,
//! loads the optional TOML configuration, and drives the two-stage
//! calibration to completion.

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use calibrator::{CalibConfig, CalibError, Calibrator};
use sim_agents::{DiffusionSimulator, Topology, TrustWeightedUpdater};
use sim_particles::{Ensemble, PARAM_NAMES};

const CONFIG_PATH: &str = "calibrator.toml";

/// Command line arguments for the calibrator
#[derive(Parser, Debug)]
#[command(name = "misinfo_abc")]
#[command(about = "Calibrates the misinformation diffusion model against sharing statistics")]
struct Args {
    /// Network topology: er, config, or pwrlaw
    topology: String,

    /// Run title used in snapshot file names
    title: String,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(args) {
        eprintln!("Calibration failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CalibError> {
    let topology: Topology = args.topology.parse()?;

    let mut config = CalibConfig::load_or_default(Path::new(CONFIG_PATH))?;
    config.simulation.topology = topology;
    config.output.run_title = args.title;

    println!("Misinformation Diffusion Calibrator");
    println!("===================================");
    println!("Topology: {}", config.simulation.topology.as_str());
    println!("Run title: {}", config.output.run_title);
    println!("Agents: {}", config.simulation.n_agents);
    println!("Ensemble size: {}", config.rejection.ensemble_size);
    println!("Snapshot dir: {}", config.output.snapshot_dir.display());
    println!();

    let simulator = DiffusionSimulator::new(config.simulation.topology, TrustWeightedUpdater);
    let mut calibrator = Calibrator::new(config, simulator)?;
    let report = calibrator.run()?;

    println!();
    println!("Calibration complete.");
    println!("  Iterations: {}", report.iterations);
    println!(
        "  Tries: {} ({} swaps, ratio {:.6})",
        report.tries, report.swaps, report.acceptance_ratio
    );
    println!("  Final epsilon: {:.6}", report.final_epsilon);
    println!("  Mean ensemble weight: {:.4}", report.mean_weight);
    println!("  Pool size: {}", report.pool_size);

    println!();
    println!("Posterior means:");
    for (name, mean) in posterior_means(calibrator.ensemble()) {
        println!("  {:<12} {:.4}", name, mean);
    }
    Ok(())
}

/// Per-parameter mean over the final ensemble, in canonical order.
fn posterior_means(ensemble: &Ensemble) -> Vec<(&'static str, f64)> {
    let n = ensemble.len() as f64;
    PARAM_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mean = ensemble
                .members()
                .iter()
                .map(|m| m.params.values()[i])
                .sum::<f64>()
                / n;
            (*name, mean)
        })
        .collect()
}
