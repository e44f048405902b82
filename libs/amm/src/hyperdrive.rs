//! Hyperdrive fixed-rate curve (YieldSpace with time stretch)
//!
//! With `z` share reserves, `y` bond reserves, `c` the share price, `μ` the
//! initial share price and `t` the stretched time remaining, the curve quotes
//! against virtual bond reserves `ŷ = y + (c·z + y)` and holds
//!
//! ```text
//! k = (c/μ)·(μ·z)^(1−t) + ŷ^(1−t)
//! ```
//!
//! constant across a trade. The marginal price of one bond in base is
//! `p = (μ·z / ŷ)^t`, which reaches 1 at maturity. Fees are a share of the
//! implied interest (`1 − p` per bond) and stay in the pool.

use crate::error::{PricingError, Result};
use crate::pricing_model::{PricingModel, HYPERDRIVE_MODEL_NAME};
use crate::types::{
    MarketDeltas, MarketSnapshot, SpotPriceInputs, TradeBreakdown, TradeOutcome, TradeRequest,
    WalletDeltas,
};
use tracing::trace;

/// Hyperdrive curve; stateless, all inputs come from the request snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperdrivePricingModel;

/// Curve parameters for one quote
#[derive(Debug, Clone, Copy)]
struct Curve {
    share_reserves: f64,
    bond_reserves: f64,
    virtual_bond_reserves: f64,
    share_price: f64,
    init_share_price: f64,
    fee_percent: f64,
    time_remaining: f64,
}

impl Curve {
    fn from_request(request: &TradeRequest) -> Result<Self> {
        let snapshot = request.snapshot.ok_or(PricingError::MissingSnapshot)?;
        validate_amount(request.trade_amount)?;
        Self::from_snapshot(&snapshot)
    }

    fn from_snapshot(snapshot: &MarketSnapshot) -> Result<Self> {
        let t = snapshot.stretched_time_remaining;
        if !(0.0..1.0).contains(&t) {
            return Err(PricingError::InvalidTimeRemaining { value: t });
        }
        if snapshot.share_reserves <= 0.0 || snapshot.bond_reserves < 0.0 {
            return Err(PricingError::InsufficientLiquidity {
                reason: format!(
                    "share_reserves={} bond_reserves={}",
                    snapshot.share_reserves, snapshot.bond_reserves
                ),
            });
        }

        Ok(Self {
            share_reserves: snapshot.share_reserves,
            bond_reserves: snapshot.bond_reserves,
            virtual_bond_reserves: virtual_bond_reserves(
                snapshot.share_reserves,
                snapshot.bond_reserves,
                snapshot.share_price,
            ),
            share_price: snapshot.share_price,
            init_share_price: snapshot.init_share_price,
            fee_percent: snapshot.fee_percent,
            time_remaining: t,
        })
    }

    fn exponent(&self) -> f64 {
        1.0 - self.time_remaining
    }

    fn spot_price(&self) -> f64 {
        spot_price(
            self.share_reserves,
            self.virtual_bond_reserves,
            self.init_share_price,
            self.time_remaining,
        )
    }

    /// `(c/μ)·(μ·z)^(1−t)`
    fn share_term(&self, share_reserves: f64) -> f64 {
        (self.share_price / self.init_share_price)
            * (self.init_share_price * share_reserves).powf(self.exponent())
    }

    fn invariant(&self) -> f64 {
        self.share_term(self.share_reserves) + self.virtual_bond_reserves.powf(self.exponent())
    }

    /// Virtual bond reserves left after `shares_in` enter the pool
    fn bonds_after_shares_in(&self, shares_in: f64) -> Result<f64> {
        let remainder = self.invariant() - self.share_term(self.share_reserves + shares_in);
        if remainder < 0.0 {
            return Err(PricingError::InsufficientLiquidity {
                reason: format!("{shares_in} shares exhaust the bond side of the curve"),
            });
        }
        finite("virtual_bond_reserves", remainder.powf(1.0 / self.exponent()))
    }

    /// Share reserves once virtual bond reserves move to `new_virtual_bonds`
    fn shares_after_bonds(&self, new_virtual_bonds: f64) -> Result<f64> {
        let remainder = (self.invariant() - new_virtual_bonds.powf(self.exponent()))
            * (self.init_share_price / self.share_price);
        if remainder < 0.0 {
            return Err(PricingError::InsufficientLiquidity {
                reason: format!(
                    "virtual bond reserves of {new_virtual_bonds} exhaust the share side of the curve"
                ),
            });
        }
        finite(
            "share_reserves",
            remainder.powf(1.0 / self.exponent()) / self.init_share_price,
        )
    }

    /// Base paid or received for one bond traded at spot, and the fee on it
    fn spot_quote(&self, bonds: f64) -> (f64, f64) {
        let without_fee_or_slippage = bonds * self.spot_price();
        let fee = self.fee_percent * (bonds - without_fee_or_slippage);
        (without_fee_or_slippage, fee)
    }

    /// Sell `bonds` to the pool for base; shared by close long and open short
    fn sell_bonds(&self, bonds: f64) -> Result<(TradeBreakdown, MarketDeltas)> {
        let new_shares = self.shares_after_bonds(self.virtual_bond_reserves + bonds)?;
        let base_without_fee = (self.share_reserves - new_shares) * self.share_price;
        let (without_fee_or_slippage, fee) = self.spot_quote(bonds);
        let base_with_fee = base_without_fee - fee;

        let shares_out = base_with_fee / self.share_price;
        if shares_out > self.share_reserves {
            return Err(PricingError::InsufficientLiquidity {
                reason: format!(
                    "{shares_out} shares out exceeds share reserves of {}",
                    self.share_reserves
                ),
            });
        }

        let breakdown = TradeBreakdown {
            without_fee_or_slippage,
            output_with_fee: base_with_fee,
            output_without_fee: base_without_fee,
            fee,
        };
        let deltas = MarketDeltas {
            d_base_asset: -shares_out,
            d_token_asset: bonds,
            d_base_asset_slippage: without_fee_or_slippage - base_without_fee,
            d_base_asset_fee: fee,
            d_token_asset_orders: 1,
            d_token_asset_volume: bonds,
            ..Default::default()
        };
        Ok((breakdown, deltas))
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(PricingError::InvalidAmount { amount });
    }
    Ok(())
}

fn finite(quantity: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PricingError::NonFinite { quantity, value })
    }
}

/// `y + (c·z + y)`
pub fn virtual_bond_reserves(share_reserves: f64, bond_reserves: f64, share_price: f64) -> f64 {
    let total_reserves = share_price * share_reserves + bond_reserves;
    bond_reserves + total_reserves
}

/// `(μ·z / ŷ)^t` where `ŷ` already includes the virtual reserves
pub fn spot_price(
    share_reserves: f64,
    virtual_bond_reserves: f64,
    init_share_price: f64,
    time_remaining: f64,
) -> f64 {
    ((init_share_price * share_reserves) / virtual_bond_reserves).powf(time_remaining)
}

impl PricingModel for HyperdrivePricingModel {
    fn model_name(&self) -> &'static str {
        HYPERDRIVE_MODEL_NAME
    }

    fn open_long(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        let curve = Curve::from_request(request)?;
        let base_in = request.trade_amount;
        let shares_in = base_in / curve.share_price;

        let new_virtual_bonds = curve.bonds_after_shares_in(shares_in)?;
        let bonds_without_fee = curve.virtual_bond_reserves - new_virtual_bonds;
        let without_fee_or_slippage = base_in / curve.spot_price();
        let fee = curve.fee_percent * (without_fee_or_slippage - base_in);
        let bonds_with_fee = bonds_without_fee - fee;

        if bonds_with_fee > curve.bond_reserves {
            return Err(PricingError::InsufficientLiquidity {
                reason: format!(
                    "{bonds_with_fee} bonds out exceeds bond reserves of {}",
                    curve.bond_reserves
                ),
            });
        }
        trace!(base_in, bonds_with_fee, fee, "Hyperdrive open long quoted");

        Ok(TradeOutcome {
            market_deltas: MarketDeltas {
                d_base_asset: shares_in,
                d_token_asset: -bonds_with_fee,
                d_token_asset_slippage: without_fee_or_slippage - bonds_without_fee,
                d_token_asset_fee: fee,
                d_base_asset_orders: 1,
                d_base_asset_volume: base_in,
                ..Default::default()
            },
            wallet_deltas: WalletDeltas {
                d_base: -base_in,
                d_longs: bonds_with_fee,
                fees_paid: fee,
                ..Default::default()
            },
            breakdown: TradeBreakdown {
                without_fee_or_slippage,
                output_with_fee: bonds_with_fee,
                output_without_fee: bonds_without_fee,
                fee,
            },
        })
    }

    fn close_long(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        let curve = Curve::from_request(request)?;
        let bonds_in = request.trade_amount;
        let (breakdown, market_deltas) = curve.sell_bonds(bonds_in)?;
        trace!(bonds_in, base_out = breakdown.output_with_fee, "Hyperdrive close long quoted");

        Ok(TradeOutcome {
            market_deltas,
            wallet_deltas: WalletDeltas {
                d_base: breakdown.output_with_fee,
                d_longs: -bonds_in,
                fees_paid: breakdown.fee,
                ..Default::default()
            },
            breakdown,
        })
    }

    fn open_short(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        let curve = Curve::from_request(request)?;
        let bonds_sold = request.trade_amount;
        let (breakdown, market_deltas) = curve.sell_bonds(bonds_sold)?;
        trace!(bonds_sold, base_out = breakdown.output_with_fee, "Hyperdrive open short quoted");

        // the short posts the bond face value and keeps the sale proceeds in the position
        Ok(TradeOutcome {
            market_deltas,
            wallet_deltas: WalletDeltas {
                d_base: breakdown.output_with_fee - bonds_sold,
                d_shorts: bonds_sold,
                fees_paid: breakdown.fee,
                ..Default::default()
            },
            breakdown,
        })
    }

    fn close_short(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        let curve = Curve::from_request(request)?;
        let bonds_out = request.trade_amount;
        if bonds_out >= curve.bond_reserves {
            return Err(PricingError::InsufficientLiquidity {
                reason: format!(
                    "{bonds_out} bonds out exceeds bond reserves of {}",
                    curve.bond_reserves
                ),
            });
        }

        let new_shares = curve.shares_after_bonds(curve.virtual_bond_reserves - bonds_out)?;
        let base_without_fee = (new_shares - curve.share_reserves) * curve.share_price;
        let (without_fee_or_slippage, fee) = curve.spot_quote(bonds_out);
        let base_with_fee = base_without_fee + fee;
        trace!(bonds_out, base_with_fee, fee, "Hyperdrive close short quoted");

        Ok(TradeOutcome {
            market_deltas: MarketDeltas {
                d_base_asset: base_with_fee / curve.share_price,
                d_token_asset: -bonds_out,
                d_base_asset_slippage: base_without_fee - without_fee_or_slippage,
                d_base_asset_fee: fee,
                d_base_asset_orders: 1,
                d_base_asset_volume: base_with_fee,
                ..Default::default()
            },
            wallet_deltas: WalletDeltas {
                d_base: bonds_out - base_with_fee,
                d_shorts: -bonds_out,
                fees_paid: fee,
                ..Default::default()
            },
            breakdown: TradeBreakdown {
                without_fee_or_slippage,
                output_with_fee: base_with_fee,
                output_without_fee: base_without_fee,
                fee,
            },
        })
    }

    fn calc_spot_price(&self, inputs: SpotPriceInputs) -> f64 {
        spot_price(
            inputs.share_reserves,
            virtual_bond_reserves(inputs.share_reserves, inputs.bond_reserves, inputs.share_price),
            inputs.init_share_price,
            inputs.time_remaining,
        )
    }
}
