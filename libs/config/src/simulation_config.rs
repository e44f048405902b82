//! Simulation Configuration Module
//!
//! Provides configuration loading and validation for market simulations.
//! Supports loading from TOML files with environment variable overrides.

use crate::defaults;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use hyperdrive_amm::time::{days_to_years, stretch_time};
use hyperdrive_amm::{ActionType, PricingModelKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable prefix, e.g. `HYPERDRIVE_SIMULATION__RANDOM_SEED=7`
pub const ENV_PREFIX: &str = "HYPERDRIVE";

/// Main simulation configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SimulationConfig {
    /// Pool parameters
    #[serde(default)]
    pub market: MarketConfig,

    /// Trade loop settings
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Agent populations trading against the pool
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentSpec>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Pool parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MarketConfig {
    pub pricing_model: PricingModelKind,
    pub share_reserves: f64,
    pub bond_reserves: f64,
    pub fee_percent: f64,
    pub token_duration_days: f64,
    pub time_stretch_constant: f64,
    pub init_share_price: f64,
    pub share_price: f64,
}

/// Trade loop settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SimulationSettings {
    pub num_trading_days: u32,
    pub random_seed: u64,
    pub vault_apr: f64,
    /// Abort the run on the first failed trade instead of logging it
    pub halt_on_errors: bool,
}

/// Policy an agent population follows
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Random feasible action each trading day
    Random,
    /// Opens a fixed-size long each trading day until out of budget
    LongOnly,
    /// Replays `trade_list`, one step per trading day
    Deterministic,
}

/// One scripted trade of a deterministic agent
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct TradeStep {
    pub action: ActionType,
    pub amount: f64,
}

/// Clipped distribution agent budgets are sampled from
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct BudgetConfig {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// One population of identically configured agents
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub policy: PolicyKind,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Fixed trade size; random policies size trades from their balance when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_amount: Option<f64>,
    #[serde(default = "default_trade_chance")]
    pub trade_chance: f64,
    /// Scripted trades for deterministic agents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trade_list: Vec<TradeStep>,
    #[serde(default)]
    pub budget: BudgetConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            pricing_model: PricingModelKind::Hyperdrive,
            share_reserves: defaults::market::SHARE_RESERVES,
            bond_reserves: defaults::market::BOND_RESERVES,
            fee_percent: defaults::market::FEE_PERCENT,
            token_duration_days: defaults::market::TOKEN_DURATION_DAYS,
            time_stretch_constant: defaults::market::TIME_STRETCH_CONSTANT,
            init_share_price: defaults::market::INIT_SHARE_PRICE,
            share_price: defaults::market::SHARE_PRICE,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            num_trading_days: defaults::simulation::NUM_TRADING_DAYS,
            random_seed: defaults::simulation::RANDOM_SEED,
            vault_apr: defaults::simulation::VAULT_APR,
            halt_on_errors: false,
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            mean: defaults::agents::BUDGET_MEAN,
            std: defaults::agents::BUDGET_STD,
            min: defaults::agents::BUDGET_MIN,
            max: defaults::agents::BUDGET_MAX,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
            json: false,
        }
    }
}

fn default_count() -> u32 {
    1
}

fn default_trade_chance() -> f64 {
    defaults::agents::TRADE_CHANCE
}

fn default_agents() -> Vec<AgentSpec> {
    vec![AgentSpec {
        name: "random".to_string(),
        policy: PolicyKind::Random,
        count: 4,
        trade_amount: None,
        trade_chance: defaults::agents::TRADE_CHANCE,
        trade_list: Vec::new(),
        budget: BudgetConfig::default(),
    }]
}

impl MarketConfig {
    /// Bond term as a year-fraction
    pub fn token_duration(&self) -> f64 {
        days_to_years(self.token_duration_days)
    }
}

impl SimulationConfig {
    /// Load configuration from a file with environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading simulation config: {:?}", path);

        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        debug!(?config, "Simulation config loaded");
        Ok(config)
    }

    /// Reject parameter combinations no simulation can run with
    pub fn validate(&self) -> Result<()> {
        let market = &self.market;
        if !(market.share_reserves > 0.0 && market.share_reserves.is_finite()) {
            bail!("market.share_reserves must be positive, got {}", market.share_reserves);
        }
        if !(market.bond_reserves >= 0.0 && market.bond_reserves.is_finite()) {
            bail!("market.bond_reserves must be non-negative, got {}", market.bond_reserves);
        }
        if !(0.0..=1.0).contains(&market.fee_percent) {
            bail!("market.fee_percent must be within [0, 1], got {}", market.fee_percent);
        }
        if !(market.token_duration_days > 0.0) {
            bail!(
                "market.token_duration_days must be positive, got {}",
                market.token_duration_days
            );
        }
        if !(market.time_stretch_constant > 0.0) {
            bail!(
                "market.time_stretch_constant must be positive, got {}",
                market.time_stretch_constant
            );
        }
        if !(market.init_share_price > 0.0 && market.share_price > 0.0) {
            bail!("market share prices must be positive");
        }
        if market.pricing_model == PricingModelKind::Hyperdrive {
            let stretched = stretch_time(market.token_duration(), market.time_stretch_constant);
            if stretched >= 1.0 {
                bail!(
                    "stretched token duration {} must be below 1; raise market.time_stretch_constant",
                    stretched
                );
            }
        }

        if self.simulation.num_trading_days == 0 {
            bail!("simulation.num_trading_days must be at least 1");
        }
        if !self.simulation.vault_apr.is_finite() || self.simulation.vault_apr <= -1.0 {
            bail!("simulation.vault_apr must be above -1, got {}", self.simulation.vault_apr);
        }

        for agent in &self.agents {
            let budget = &agent.budget;
            if !(budget.min > 0.0 && budget.min <= budget.max && budget.std >= 0.0) {
                bail!("agent {}: budget needs 0 < min <= max and std >= 0", agent.name);
            }
            if !(0.0..=1.0).contains(&agent.trade_chance) {
                bail!("agent {}: trade_chance must be within [0, 1]", agent.name);
            }
            if agent.policy == PolicyKind::Deterministic && agent.trade_list.is_empty() {
                bail!("agent {}: deterministic policy needs a trade_list", agent.name);
            }
            for step in &agent.trade_list {
                if !(step.amount > 0.0 && step.amount.is_finite()) {
                    bail!(
                        "agent {}: trade_list amount for {} must be positive",
                        agent.name,
                        step.action
                    );
                }
            }
            if let Some(amount) = agent.trade_amount {
                if !(amount > 0.0 && amount.is_finite()) {
                    bail!("agent {}: trade_amount must be positive", agent.name);
                }
            }
        }
        Ok(())
    }

    /// Render as TOML, e.g. to record the exact settings of a run
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Convenience function to load configuration, falling back to defaults
pub fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::load(path),
        None => {
            info!("No config file given, using defaults");
            let config = SimulationConfig {
                agents: default_agents(),
                ..Default::default()
            };
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("simulation.toml");

        let config_content = r#"
[market]
pricing_model = "constant_product"
share_reserves = 500.0
bond_reserves = 750.0
fee_percent = 0.003

[simulation]
num_trading_days = 10
random_seed = 42
halt_on_errors = true

[[agents]]
name = "whale"
policy = "long_only"
trade_amount = 250.0

[agents.budget]
mean = 1000.0
std = 0.0
min = 1000.0
max = 1000.0

[logging]
level = "debug"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = SimulationConfig::load(&config_path).unwrap();

        assert_eq!(config.market.pricing_model, PricingModelKind::ConstantProduct);
        assert_eq!(config.market.share_reserves, 500.0);
        assert_eq!(config.market.fee_percent, 0.003);
        // unset keys fall back to defaults
        assert_eq!(config.market.token_duration_days, defaults::market::TOKEN_DURATION_DAYS);
        assert_eq!(config.simulation.num_trading_days, 10);
        assert_eq!(config.simulation.random_seed, 42);
        assert!(config.simulation.halt_on_errors);
        assert_eq!(config.logging.level, "debug");

        assert_eq!(config.agents.len(), 1);
        let agent = &config.agents[0];
        assert_eq!(agent.policy, PolicyKind::LongOnly);
        assert_eq!(agent.count, 1);
        assert_eq!(agent.trade_amount, Some(250.0));
        assert_eq!(agent.budget.max, 1000.0);
        assert_eq!(agent.trade_chance, defaults::agents::TRADE_CHANCE);
    }

    #[test]
    fn test_load_deterministic_trade_list() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("simulation.toml");
        fs::write(
            &config_path,
            r#"
[[agents]]
name = "scripted"
policy = "deterministic"
trade_list = [
    { action = "open_long", amount = 100.0 },
    { action = "close_long", amount = 50.0 },
]
"#,
        )
        .unwrap();

        let config = SimulationConfig::load(&config_path).unwrap();
        let agent = &config.agents[0];
        assert_eq!(agent.policy, PolicyKind::Deterministic);
        assert_eq!(
            agent.trade_list,
            vec![
                TradeStep {
                    action: ActionType::OpenLong,
                    amount: 100.0
                },
                TradeStep {
                    action: ActionType::CloseLong,
                    amount: 50.0
                },
            ]
        );

        fs::write(
            &config_path,
            "[[agents]]\nname = \"scripted\"\npolicy = \"deterministic\"\n",
        )
        .unwrap();
        let err = SimulationConfig::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("trade_list"));

        fs::write(
            &config_path,
            "[[agents]]\nname = \"lp\"\npolicy = \"deterministic\"\ntrade_list = [{ action = \"add_liquidity\", amount = 1.0 }]\n",
        )
        .unwrap();
        assert!(SimulationConfig::load(&config_path).is_err());
    }

    #[test]
    fn test_environment_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("simulation.toml");
        fs::write(&config_path, "[simulation]\nvault_apr = 0.05\n").unwrap();

        std::env::set_var("HYPERDRIVE_SIMULATION__VAULT_APR", "0.07");
        let config = SimulationConfig::load(&config_path);
        std::env::remove_var("HYPERDRIVE_SIMULATION__VAULT_APR");

        assert_eq!(config.unwrap().simulation.vault_apr, 0.07);
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(SimulationConfig::load(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = load_config(None).unwrap();
        assert_eq!(config.market.pricing_model, PricingModelKind::Hyperdrive);
        assert_eq!(config.agents.len(), 1);
        assert!(config.market.token_duration() > 0.49 && config.market.token_duration() < 0.5);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = load_config(None).unwrap();
        config.market.fee_percent = 1.5;
        assert!(config.validate().is_err());

        let mut config = load_config(None).unwrap();
        config.market.time_stretch_constant = 0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stretched token duration"));

        let mut config = load_config(None).unwrap();
        config.agents[0].budget.min = 20_000.0;
        assert!(config.validate().is_err());

        let mut config = load_config(None).unwrap();
        config.simulation.num_trading_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_preserves_agents() {
        let config = load_config(None).unwrap();
        let rendered = config.to_toml().unwrap();
        let parsed: SimulationConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.agents.len(), config.agents.len());
        assert_eq!(parsed.agents[0].policy, PolicyKind::Random);
    }
}
