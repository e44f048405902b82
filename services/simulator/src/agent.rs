//! Agents, their budgets and wallets
//!
//! The market never tracks positions; every trader keeps its own wallet and
//! applies the wallet deltas a swap hands back.

use crate::policy::Policy;
use hyperdrive_amm::{ActionType, TradeRequest, WalletDeltas};
use hyperdrive_config::BudgetConfig;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

/// Clipped distribution agent budgets are drawn from
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Budget {
    /// Sample a normal distribution around the mean, clipped to `[min, max]`
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let raw = match Normal::new(self.mean, self.std) {
            Ok(normal) if self.std > 0.0 => normal.sample(rng),
            _ => self.mean,
        };
        raw.clamp(self.min, self.max)
    }
}

impl From<BudgetConfig> for Budget {
    fn from(config: BudgetConfig) -> Self {
        Self {
            mean: config.mean,
            std: config.std,
            min: config.min,
            max: config.max,
        }
    }
}

/// Open bond position, keyed by the market time it was minted at
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub mint_time: f64,
    pub bonds: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Wallet {
    pub base: f64,
    pub longs: Vec<Position>,
    pub shorts: Vec<Position>,
    pub fees_paid: f64,
}

impl Wallet {
    pub fn new(base: f64) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    /// Book the result of an executed trade
    ///
    /// Opens mint a new position at `market_time`; closes shrink the position
    /// minted at the request's mint time.
    pub fn apply(&mut self, request: &TradeRequest, deltas: &WalletDeltas, market_time: f64) {
        self.base += deltas.d_base;
        self.fees_paid += deltas.fees_paid;

        let mint_time = request.mint_time.unwrap_or(market_time);
        match request.action_type {
            ActionType::OpenLong => add_position(&mut self.longs, market_time, deltas.d_longs),
            ActionType::CloseLong => reduce_position(&mut self.longs, mint_time, -deltas.d_longs),
            ActionType::OpenShort => add_position(&mut self.shorts, market_time, deltas.d_shorts),
            ActionType::CloseShort => {
                reduce_position(&mut self.shorts, mint_time, -deltas.d_shorts)
            }
        }
    }

    pub fn total_longs(&self) -> f64 {
        self.longs.iter().map(|p| p.bonds).sum()
    }

    pub fn total_shorts(&self) -> f64 {
        self.shorts.iter().map(|p| p.bonds).sum()
    }

    /// Close actions for every open position
    pub fn liquidation_trades(&self) -> Vec<TradeRequest> {
        let longs = self
            .longs
            .iter()
            .map(|p| TradeRequest::close_long(p.bonds, p.mint_time));
        let shorts = self
            .shorts
            .iter()
            .map(|p| TradeRequest::close_short(p.bonds, p.mint_time));
        longs.chain(shorts).collect()
    }
}

fn add_position(positions: &mut Vec<Position>, mint_time: f64, bonds: f64) {
    if bonds <= 0.0 {
        return;
    }
    match positions.iter_mut().find(|p| p.mint_time == mint_time) {
        Some(position) => position.bonds += bonds,
        None => positions.push(Position { mint_time, bonds }),
    }
}

fn reduce_position(positions: &mut Vec<Position>, mint_time: f64, bonds: f64) {
    if let Some(position) = positions.iter_mut().find(|p| p.mint_time == mint_time) {
        position.bonds -= bonds;
    }
    // dust from float subtraction counts as closed
    positions.retain(|p| p.bonds > 1e-9);
}

pub struct Agent {
    pub name: String,
    pub wallet: Wallet,
    pub policy: Box<dyn Policy>,
}

impl Agent {
    pub fn new(name: String, budget: f64, policy: Box<dyn Policy>) -> Self {
        Self {
            name,
            wallet: Wallet::new(budget),
            policy,
        }
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            name: self.name.clone(),
            base: self.wallet.base,
            longs: self.wallet.total_longs(),
            shorts: self.wallet.total_shorts(),
            fees_paid: self.wallet.fees_paid,
        }
    }
}

/// End-of-run view of one agent
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub base: f64,
    pub longs: f64,
    pub shorts: f64,
    pub fees_paid: f64,
}
