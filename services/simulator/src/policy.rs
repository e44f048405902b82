//! Trading policies
//!
//! A policy looks at its own wallet and a read-only market view and proposes
//! the trades for one trading day. It never touches the market directly.

use crate::agent::Wallet;
use hyperdrive_amm::{ActionType, TradeRequest};
use hyperdrive_config::{AgentSpec, PolicyKind, TradeStep};
use hyperdrive_market::MarketStats;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;

/// Smallest base balance worth trading with
const MIN_TRADE_AMOUNT: f64 = 1.0;

pub trait Policy: Send {
    fn name(&self) -> &'static str;

    /// Trades to submit this trading day, in order
    fn action(&mut self, market: &MarketStats, wallet: &Wallet, rng: &mut StdRng) -> Vec<TradeRequest>;
}

/// Build the policy an agent population is configured with
pub fn build_policy(spec: &AgentSpec) -> Box<dyn Policy> {
    match spec.policy {
        PolicyKind::Random => Box::new(RandomPolicy {
            trade_chance: spec.trade_chance,
            trade_amount: spec.trade_amount,
        }),
        PolicyKind::LongOnly => Box::new(LongOnlyPolicy {
            trade_chance: spec.trade_chance,
            trade_amount: spec.trade_amount.unwrap_or(spec.budget.min / 10.0),
        }),
        PolicyKind::Deterministic => Box::new(DeterministicPolicy::new(spec.trade_list.clone())),
    }
}

/// Picks one feasible action at random
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    pub trade_chance: f64,
    pub trade_amount: Option<f64>,
}

impl RandomPolicy {
    fn size(&self, balance: f64, rng: &mut StdRng) -> f64 {
        match self.trade_amount {
            Some(amount) => amount.min(balance),
            None => balance * rng.gen_range(0.05..0.5),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn action(&mut self, _market: &MarketStats, wallet: &Wallet, rng: &mut StdRng) -> Vec<TradeRequest> {
        if !rng.gen_bool(self.trade_chance) {
            return Vec::new();
        }

        let mut feasible = Vec::with_capacity(4);
        if wallet.base > MIN_TRADE_AMOUNT {
            feasible.push(ActionType::OpenLong);
            feasible.push(ActionType::OpenShort);
        }
        if !wallet.longs.is_empty() {
            feasible.push(ActionType::CloseLong);
        }
        if !wallet.shorts.is_empty() {
            feasible.push(ActionType::CloseShort);
        }

        let Some(action) = feasible.choose(rng).copied() else {
            return Vec::new();
        };
        let request = match action {
            ActionType::OpenLong => TradeRequest::open_long(self.size(wallet.base, rng)),
            // shorts post at most their face value, so the balance bounds the bonds sold
            ActionType::OpenShort => TradeRequest::open_short(self.size(wallet.base, rng)),
            ActionType::CloseLong => match wallet.longs.choose(rng) {
                Some(position) => TradeRequest::close_long(position.bonds, position.mint_time),
                None => return Vec::new(),
            },
            ActionType::CloseShort => match wallet.shorts.choose(rng) {
                Some(position) => TradeRequest::close_short(position.bonds, position.mint_time),
                None => return Vec::new(),
            },
        };
        vec![request]
    }
}

/// Opens a fixed-size long each trading day while the budget lasts
#[derive(Debug, Clone)]
pub struct LongOnlyPolicy {
    pub trade_chance: f64,
    pub trade_amount: f64,
}

impl Policy for LongOnlyPolicy {
    fn name(&self) -> &'static str {
        "long_only"
    }

    fn action(&mut self, _market: &MarketStats, wallet: &Wallet, rng: &mut StdRng) -> Vec<TradeRequest> {
        if wallet.base < self.trade_amount || !rng.gen_bool(self.trade_chance) {
            return Vec::new();
        }
        vec![TradeRequest::open_long(self.trade_amount)]
    }
}

/// Replays a scripted trade list, one step per trading day
///
/// Closes settle the wallet's oldest open position of that side; a close with
/// nothing to settle is dropped.
#[derive(Debug, Clone)]
pub struct DeterministicPolicy {
    trade_list: VecDeque<TradeStep>,
}

impl DeterministicPolicy {
    pub fn new(trade_list: Vec<TradeStep>) -> Self {
        Self {
            trade_list: trade_list.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.trade_list.len()
    }
}

impl Policy for DeterministicPolicy {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    fn action(&mut self, _market: &MarketStats, wallet: &Wallet, _rng: &mut StdRng) -> Vec<TradeRequest> {
        let Some(step) = self.trade_list.pop_front() else {
            return Vec::new();
        };

        let request = match step.action {
            ActionType::OpenLong => TradeRequest::open_long(step.amount),
            ActionType::OpenShort => TradeRequest::open_short(step.amount),
            ActionType::CloseLong | ActionType::CloseShort => {
                let positions = if step.action == ActionType::CloseLong {
                    &wallet.longs
                } else {
                    &wallet.shorts
                };
                match positions.first() {
                    Some(position) => TradeRequest::new(step.action, step.amount)
                        .with_mint_time(position.mint_time),
                    None => {
                        debug!(action = %step.action, "No open position to close, skipping step");
                        return Vec::new();
                    }
                }
            }
        };
        vec![request]
    }
}
