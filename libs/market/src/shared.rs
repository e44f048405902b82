//! Single-writer wrapper for markets reachable from more than one caller
//!
//! Trades against one pool have no ordering semantics of their own, so every
//! mutating call holds the lock for its whole duration. Readers never observe
//! a half-applied set of deltas.

use crate::error::Result;
use crate::market::{Market, MarketStats};
use hyperdrive_amm::{MarketDeltas, TradeRequest, WalletDeltas};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedMarket {
    inner: Arc<Mutex<Market>>,
}

impl SharedMarket {
    pub fn new(market: Market) -> Self {
        Self {
            inner: Arc::new(Mutex::new(market)),
        }
    }

    pub fn swap(&self, request: TradeRequest) -> Result<WalletDeltas> {
        self.inner.lock().swap(request)
    }

    pub fn update_market(&self, market_deltas: &MarketDeltas) -> Result<()> {
        self.inner.lock().update_market(market_deltas)
    }

    pub fn tick(&self, delta_time: f64) {
        self.inner.lock().tick(delta_time);
    }

    pub fn set_share_price(&self, share_price: f64) -> Result<()> {
        self.inner.lock().set_share_price(share_price)
    }

    pub fn stats(&self) -> MarketStats {
        self.inner.lock().stats()
    }

    pub fn get_market_state_string(&self) -> String {
        self.inner.lock().get_market_state_string()
    }

    /// Run a read-only closure against a consistent view of the market
    pub fn with_market<R>(&self, f: impl FnOnce(&Market) -> R) -> R {
        f(&self.inner.lock())
    }
}
