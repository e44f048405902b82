//! Hyperdrive simulation entry point

use anyhow::{Context, Result};
use clap::Parser;
use hyperdrive_config::load_config;
use hyperdrive_simulator::{init_tracing, Simulator};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of trading days
    #[arg(long)]
    days: Option<u32>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.simulation.random_seed = seed;
    }
    if let Some(days) = args.days {
        config.simulation.num_trading_days = days;
    }
    config.validate()?;

    init_tracing(&config.logging.level, args.log_json || config.logging.json)?;

    info!("Starting Hyperdrive simulation");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    debug!("Effective configuration:\n{}", config.to_toml()?);

    let report = Simulator::from_config(config)?.run()?;
    let rendered = serde_json::to_string_pretty(&report).context("Failed to render report")?;
    println!("{}", rendered);
    Ok(())
}
