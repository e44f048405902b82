//! Daily trade loop
//!
//! Each trading day every agent asks its policy for trades, the trades go
//! through the market one at a time, then the clock advances one day and the
//! vault accrues interest. Open positions are liquidated after the last day.

use crate::agent::{Agent, AgentSummary, Budget};
use crate::policy::build_policy;
use anyhow::{Context, Result};
use hyperdrive_amm::time::{days_to_years, DAYS_PER_YEAR};
use hyperdrive_amm::TradeRequest;
use hyperdrive_config::{MarketConfig, SimulationConfig};
use hyperdrive_market::{Market, MarketParams, MarketStats, SharedMarket};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Outcome of a full run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub trading_days: u32,
    pub trades_executed: u64,
    pub trades_failed: u64,
    pub market: MarketStats,
    pub agents: Vec<AgentSummary>,
}

pub struct Simulator {
    config: SimulationConfig,
    market: SharedMarket,
    agents: Vec<Agent>,
    rng: StdRng,
    trades_executed: u64,
    trades_failed: u64,
}

/// Market parameters for a config section
pub fn market_params(config: &MarketConfig) -> MarketParams {
    MarketParams::new(
        config.share_reserves,
        config.bond_reserves,
        config.fee_percent,
        config.token_duration(),
    )
    .with_time_stretch(config.time_stretch_constant)
    .with_share_prices(config.init_share_price, config.share_price)
}

impl Simulator {
    /// Build the market and sample every agent's budget from the run seed
    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        let market = Market::new(market_params(&config.market), config.market.pricing_model.build())
            .context("Failed to initialize market")?;
        let mut rng = StdRng::seed_from_u64(config.simulation.random_seed);

        let mut agents = Vec::new();
        for spec in &config.agents {
            let budget = Budget::from(spec.budget);
            for index in 0..spec.count {
                let name = format!("{}_{}", spec.name, index);
                let base = budget.sample(&mut rng);
                let policy = build_policy(spec);
                debug!(agent = %name, policy = policy.name(), budget = base, "Agent created");
                agents.push(Agent::new(name, base, policy));
            }
        }

        info!(
            pricing_model = market.pricing_model_name(),
            agents = agents.len(),
            seed = config.simulation.random_seed,
            "Simulator initialized"
        );

        Ok(Self {
            config,
            market: SharedMarket::new(market),
            agents,
            rng,
            trades_executed: 0,
            trades_failed: 0,
        })
    }

    /// Handle onto the market, e.g. for a concurrent observer
    pub fn market(&self) -> SharedMarket {
        self.market.clone()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Run every trading day, then liquidate
    pub fn run(&mut self) -> Result<SimulationReport> {
        let days = self.config.simulation.num_trading_days;
        for day in 0..days {
            self.run_day(day)?;
        }
        self.liquidate()?;

        info!(
            trades_executed = self.trades_executed,
            trades_failed = self.trades_failed,
            "Simulation finished"
        );
        info!("Final market state:\n{}", self.market.get_market_state_string());

        Ok(self.report())
    }

    /// One trading day: agent trades, then clock and vault advance
    pub fn run_day(&mut self, day: u32) -> Result<()> {
        debug!(day, "Trading day");
        for index in 0..self.agents.len() {
            let view = self.market.stats();
            let agent = &mut self.agents[index];
            let trades = agent.policy.action(&view, &agent.wallet, &mut self.rng);
            for request in trades {
                self.execute(index, request)?;
            }
        }

        self.market.tick(days_to_years(1.0));
        let share_price = self.market.stats().share_price
            * (1.0 + self.config.simulation.vault_apr / DAYS_PER_YEAR);
        self.market
            .set_share_price(share_price)
            .context("Vault accrual produced an invalid share price")?;
        Ok(())
    }

    /// Close every open position each agent holds
    pub fn liquidate(&mut self) -> Result<()> {
        info!("Liquidating open positions");
        for index in 0..self.agents.len() {
            for request in self.agents[index].wallet.liquidation_trades() {
                self.execute(index, request)?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, index: usize, request: TradeRequest) -> Result<()> {
        let market_time = self.market.stats().time;
        let agent = &mut self.agents[index];

        match self.market.swap(request.clone()) {
            Ok(deltas) => {
                agent.wallet.apply(&request, &deltas, market_time);
                self.trades_executed += 1;
                debug!(
                    agent = %agent.name,
                    action = %request.action_type,
                    amount = request.trade_amount,
                    d_base = deltas.d_base,
                    "Trade executed"
                );
                if agent.wallet.base < 0.0 {
                    warn!(agent = %agent.name, base = agent.wallet.base, "Agent overdrawn");
                }
                Ok(())
            }
            Err(err) if self.config.simulation.halt_on_errors => Err(anyhow::Error::new(err)
                .context(format!(
                    "{} failed to {} {}",
                    agent.name, request.action_type, request.trade_amount
                ))),
            Err(err) => {
                self.trades_failed += 1;
                error!(
                    agent = %agent.name,
                    action = %request.action_type,
                    amount = request.trade_amount,
                    "Trade failed: {}",
                    err
                );
                Ok(())
            }
        }
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            trading_days: self.config.simulation.num_trading_days,
            trades_executed: self.trades_executed,
            trades_failed: self.trades_failed,
            market: self.market.stats(),
            agents: self.agents.iter().map(Agent::summary).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdrive_config::{load_config, BudgetConfig};

    #[test]
    fn test_market_params_convert_days_to_years() {
        let mut config = MarketConfig::default();
        config.token_duration_days = 365.0;
        let params = market_params(&config);
        assert_eq!(params.token_duration, 1.0);
        assert_eq!(params.time_stretch_constant, config.time_stretch_constant);
    }

    #[test]
    fn test_agents_are_expanded_per_population() {
        let mut config = load_config(None).unwrap();
        let mut whales = config.agents[0].clone();
        whales.name = "whale".to_string();
        whales.count = 2;
        whales.budget = BudgetConfig {
            mean: 50_000.0,
            std: 5_000.0,
            min: 40_000.0,
            max: 60_000.0,
        };
        config.agents.push(whales);

        let sim = Simulator::from_config(config.clone()).unwrap();
        let specs: Vec<_> = config
            .agents
            .iter()
            .flat_map(|spec| std::iter::repeat(spec).take(spec.count as usize))
            .collect();
        assert_eq!(sim.agents().len(), specs.len());
        assert_eq!(sim.agents()[0].name, "random_0");
        assert_eq!(sim.agents()[specs.len() - 1].name, "whale_1");

        for (agent, spec) in sim.agents().iter().zip(&specs) {
            assert!(agent.name.starts_with(&spec.name));
            assert!(agent.wallet.base >= spec.budget.min && agent.wallet.base <= spec.budget.max);
        }
    }

    #[test]
    fn test_day_advances_clock_and_share_price() {
        let mut config = load_config(None).unwrap();
        config.agents.clear();
        config.simulation.vault_apr = 0.365;
        let mut sim = Simulator::from_config(config).unwrap();

        sim.run_day(0).unwrap();
        let stats = sim.market().stats();
        assert!((stats.time - 1.0 / 365.0).abs() < 1e-15);
        assert!((stats.share_price - 1.001).abs() < 1e-12);
    }
}
