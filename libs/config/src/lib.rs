//! # Hyperdrive Simulation Configuration
//!
//! Centralized configuration and defaults for market simulations.
//!
//! ## Features
//!
//! - **Market Parameters**: Reserves, fee, bond term, time stretch, share prices
//! - **Trade Loop Settings**: Trading days, random seed, vault yield, error policy
//! - **Agent Populations**: Policy, count, budget distribution, trade sizing
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hyperdrive_config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("config/simulation.toml")))?;
//! println!("{} trading days", config.simulation.num_trading_days);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod simulation_config;

// Re-export commonly used types
pub use simulation_config::{
    load_config, AgentSpec, BudgetConfig, LoggingConfig, MarketConfig, PolicyKind,
    SimulationConfig, SimulationSettings, TradeStep, ENV_PREFIX,
};
