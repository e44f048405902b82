//! # Hyperdrive Simulator
//!
//! Agent-driven simulation of a fixed-rate Hyperdrive market.
//!
//! ## Components
//!
//! - **Agents**: budgets sampled from a clipped distribution, wallets that
//!   book the deltas every swap returns
//! - **Policies**: per-day trade decisions (`random`, `long_only`)
//! - **Trade loop**: daily trades, clock ticks, vault accrual and final
//!   liquidation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hyperdrive_config::load_config;
//! use hyperdrive_simulator::Simulator;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = load_config(None)?;
//! let report = Simulator::from_config(config)?.run()?;
//! println!("{} trades", report.trades_executed);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod logging;
pub mod policy;
pub mod trade_loop;

pub use agent::{Agent, AgentSummary, Budget, Position, Wallet};
pub use logging::init_tracing;
pub use policy::{build_policy, LongOnlyPolicy, Policy, RandomPolicy};
pub use trade_loop::{market_params, SimulationReport, Simulator};
