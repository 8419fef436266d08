//! # Tempo
//!
//! CPU scheduling policy simulator.
//!
//! Replays a known workload under STCF, Round Robin and a simplified CFS (plus
//! FIFO and SJF for reference) and reports turnaround, response, fairness and
//! throughput for each.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Workload   │──▶│  Simulation  │──▶│   Metrics    │──▶│    Report    │
//! │ file|scenario│   │ (tempo-core) │   │              │   │ table | json │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```

mod config;
mod metrics;
mod report;
mod simulation;
mod workload;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tempo_core::Policy;
use tracing::info;

use crate::config::TempoConfig;
use crate::metrics::FairnessPolicy;
use crate::report::{OutputFormat, RunReport};
use crate::simulation::Simulation;
use crate::workload::{Scenario, Workload};

/// Tempo - CPU scheduling policy simulator
#[derive(Parser, Debug)]
#[command(name = "tempo", version, about)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "tempo.yaml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// How the fairness index measures elapsed time
    #[arg(long, global = true, value_enum)]
    fairness: Option<FairnessPolicy>,

    /// Round Robin quantum
    #[arg(short, long, global = true)]
    quantum: Option<u64>,

    /// Include the execution timeline
    #[arg(long, global = true)]
    timeline: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one policy over a workload file
    Run {
        /// Policy (fifo, sjf, stcf, rr, cfs)
        policy: Policy,

        /// Workload file
        workload: PathBuf,
    },

    /// Compare STCF, RR and CFS over a workload file
    Compare {
        /// Workload file
        workload: PathBuf,
    },

    /// Compare policies over a predefined workload
    Scenario {
        /// Scenario name
        #[arg(value_enum)]
        name: Scenario,
    },

    /// Generate a random workload file
    Generate {
        /// Number of processes
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,

        /// Random seed
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    info!("Tempo v{} starting", env!("CARGO_PKG_VERSION"));

    // Load configuration, then apply command-line overrides
    let mut config = config::load_config(&args.config)?;
    apply_overrides(&mut config, &args);
    config.scheduler.validate()?;

    match args.command {
        Commands::Run { policy, workload } => {
            let workload = load_workload(&workload)?;
            let report = Simulation::new(workload, config.clone()).run(policy)?;
            emit_run(&report, &config)
        }
        Commands::Compare { workload } => {
            let workload = load_workload(&workload)?;
            let sim = Simulation::new(workload, config.clone());
            emit_comparison(&sim, &sim.compare()?, &config)
        }
        Commands::Scenario { name } => {
            info!("Scenario: {}", name.description());
            let sim = Simulation::new(name.build(), config.clone());
            emit_comparison(&sim, &sim.compare()?, &config)
        }
        Commands::Generate { count, seed, output } => {
            let text = Workload::random(count, seed).to_text();
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {} processes to {}", count, path.display());
                }
                None => print!("{}", text),
            }
            Ok(())
        }
    }
}

fn apply_overrides(config: &mut TempoConfig, args: &Args) {
    if let Some(quantum) = args.quantum {
        config.scheduler.rr_quantum = quantum;
    }
    if let Some(fairness) = args.fairness {
        config.report.fairness = fairness;
    }
    if let Some(format) = args.format {
        config.report.format = format;
    }
    if args.timeline {
        config.report.timeline = true;
    }
}

fn load_workload(path: &Path) -> Result<Workload> {
    let workload = Workload::load(path)
        .with_context(|| format!("Failed to read workload {}", path.display()))?;
    info!(
        "Loaded {} processes from {} ({} lines skipped)",
        workload.len(),
        path.display(),
        workload.skipped()
    );
    Ok(workload)
}

fn emit_run(report: &RunReport, config: &TempoConfig) -> Result<()> {
    match config.report.format {
        OutputFormat::Table => print!("{}", report::render_run(report, config.report.precision)),
        OutputFormat::Json => println!("{}", report::to_json(report)?),
    }
    Ok(())
}

fn emit_comparison(sim: &Simulation, reports: &[RunReport], config: &TempoConfig) -> Result<()> {
    let precision = config.report.precision;
    match config.report.format {
        OutputFormat::Table => {
            println!("{}", report::render_workload(sim.workload()));
            for r in reports {
                println!("{}", report::render_run(r, precision));
            }
            print!("{}", report::render_comparison(reports, precision));
        }
        OutputFormat::Json => println!("{}", report::to_json(reports)?),
    }
    Ok(())
}
