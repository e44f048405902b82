//! Constant product (x*y=k) curve between shares and bonds
//!
//! Preserves full precision using Decimal internally; values cross the
//! pricing boundary as f64. This curve has no time component, so the market
//! does not track a spot price for it.

use crate::error::{PricingError, Result};
use crate::pricing_model::PricingModel;
use crate::types::{MarketDeltas, TradeBreakdown, TradeOutcome, TradeRequest, WalletDeltas};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Constant product curve; stateless, all inputs come from the request snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantProductPricingModel;

/// Constant product math functions with zero precision loss
pub struct ConstantProductMath;

impl ConstantProductMath {
    /// Calculate exact output amount using the x*y=k formula
    ///
    /// # Arguments
    /// * `amount_in` - Input token amount
    /// * `reserve_in` - Input token reserve
    /// * `reserve_out` - Output token reserve
    /// * `fee` - Fee fraction charged on the input (0.003 = 0.3%)
    ///
    /// # Returns
    /// Exact output amount after fees and slippage
    pub fn calculate_output_amount(
        amount_in: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
        fee: Decimal,
    ) -> Result<Decimal> {
        if amount_in <= dec!(0) {
            return Err(invalid_amount(amount_in));
        }
        if reserve_in <= dec!(0) || reserve_out <= dec!(0) {
            return Err(PricingError::InsufficientLiquidity {
                reason: "Reserves must be positive".to_string(),
            });
        }

        let amount_in_after_fee = amount_in * (dec!(1) - fee);

        // output = (amount_in_after_fee * reserve_out) / (reserve_in + amount_in_after_fee)
        let numerator = amount_in_after_fee * reserve_out;
        let denominator = reserve_in + amount_in_after_fee;

        if denominator <= dec!(0) {
            return Err(PricingError::InsufficientLiquidity {
                reason: "Invalid calculation: denominator would be zero".to_string(),
            });
        }

        Ok(numerator / denominator)
    }

    /// Calculate required input amount for desired output (reverse calculation)
    pub fn calculate_input_amount(
        amount_out: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
        fee: Decimal,
    ) -> Result<Decimal> {
        if amount_out <= dec!(0) {
            return Err(invalid_amount(amount_out));
        }
        if amount_out >= reserve_out {
            return Err(PricingError::InsufficientLiquidity {
                reason: "Output exceeds reserves".to_string(),
            });
        }

        let numerator = reserve_in * amount_out;
        let denominator = (reserve_out - amount_out) * (dec!(1) - fee);

        if denominator <= dec!(0) {
            return Err(PricingError::InsufficientLiquidity {
                reason: "Invalid calculation: denominator would be zero".to_string(),
            });
        }

        Ok(numerator / denominator)
    }

    /// Output at the pre-trade reserve ratio, i.e. with infinite liquidity
    pub fn calculate_ideal_output(
        amount_in: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
    ) -> Result<Decimal> {
        if reserve_in <= dec!(0) {
            return Err(PricingError::InsufficientLiquidity {
                reason: "Reserves must be positive".to_string(),
            });
        }
        Ok(amount_in * reserve_out / reserve_in)
    }
}

fn invalid_amount(amount: Decimal) -> PricingError {
    PricingError::InvalidAmount {
        amount: amount.to_f64().unwrap_or(f64::NAN),
    }
}

fn to_decimal(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or(PricingError::Conversion { value })
}

fn to_f64(quantity: &'static str, value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or(PricingError::NonFinite { quantity, value: f64::NAN })
}

/// Decimal view of the request snapshot
struct Pool {
    amount: Decimal,
    share_reserves: Decimal,
    bond_reserves: Decimal,
    share_price: Decimal,
    fee: Decimal,
}

impl Pool {
    fn from_request(request: &TradeRequest) -> Result<Self> {
        let snapshot = request.snapshot.ok_or(PricingError::MissingSnapshot)?;
        if !request.trade_amount.is_finite() || request.trade_amount <= 0.0 {
            return Err(PricingError::InvalidAmount {
                amount: request.trade_amount,
            });
        }
        let share_price = to_decimal(snapshot.share_price)?;
        if share_price <= dec!(0) {
            return Err(PricingError::InsufficientLiquidity {
                reason: format!("share price {} must be positive", snapshot.share_price),
            });
        }

        Ok(Self {
            amount: to_decimal(request.trade_amount)?,
            share_reserves: to_decimal(snapshot.share_reserves)?,
            bond_reserves: to_decimal(snapshot.bond_reserves)?,
            share_price,
            fee: to_decimal(snapshot.fee_percent)?,
        })
    }

    /// Sell `amount` bonds into the pool for shares
    fn sell_bonds(&self) -> Result<(TradeBreakdown, MarketDeltas)> {
        let shares_with_fee = ConstantProductMath::calculate_output_amount(
            self.amount,
            self.bond_reserves,
            self.share_reserves,
            self.fee,
        )?;
        let shares_without_fee = ConstantProductMath::calculate_output_amount(
            self.amount,
            self.bond_reserves,
            self.share_reserves,
            dec!(0),
        )?;
        let ideal_shares = ConstantProductMath::calculate_ideal_output(
            self.amount,
            self.bond_reserves,
            self.share_reserves,
        )?;

        let base_with_fee = shares_with_fee * self.share_price;
        let base_without_fee = shares_without_fee * self.share_price;
        let ideal_base = ideal_shares * self.share_price;
        let fee = base_without_fee - base_with_fee;

        let breakdown = TradeBreakdown {
            without_fee_or_slippage: to_f64("without_fee_or_slippage", ideal_base)?,
            output_with_fee: to_f64("output_with_fee", base_with_fee)?,
            output_without_fee: to_f64("output_without_fee", base_without_fee)?,
            fee: to_f64("fee", fee)?,
        };
        let deltas = MarketDeltas {
            d_base_asset: -to_f64("d_base_asset", shares_with_fee)?,
            d_token_asset: to_f64("d_token_asset", self.amount)?,
            d_base_asset_slippage: to_f64("d_base_asset_slippage", ideal_base - base_without_fee)?,
            d_base_asset_fee: breakdown.fee,
            d_token_asset_orders: 1,
            d_token_asset_volume: to_f64("d_token_asset_volume", self.amount)?,
            ..Default::default()
        };
        Ok((breakdown, deltas))
    }
}

impl PricingModel for ConstantProductPricingModel {
    fn model_name(&self) -> &'static str {
        "ConstantProduct"
    }

    fn open_long(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        let pool = Pool::from_request(request)?;
        let shares_in = pool.amount / pool.share_price;

        let bonds_with_fee = ConstantProductMath::calculate_output_amount(
            shares_in,
            pool.share_reserves,
            pool.bond_reserves,
            pool.fee,
        )?;
        let bonds_without_fee = ConstantProductMath::calculate_output_amount(
            shares_in,
            pool.share_reserves,
            pool.bond_reserves,
            dec!(0),
        )?;
        let ideal_bonds = ConstantProductMath::calculate_ideal_output(
            shares_in,
            pool.share_reserves,
            pool.bond_reserves,
        )?;
        let fee = bonds_without_fee - bonds_with_fee;

        let bonds_out = to_f64("output_with_fee", bonds_with_fee)?;
        let fee = to_f64("fee", fee)?;
        Ok(TradeOutcome {
            market_deltas: MarketDeltas {
                d_base_asset: to_f64("d_base_asset", shares_in)?,
                d_token_asset: -bonds_out,
                d_token_asset_slippage: to_f64(
                    "d_token_asset_slippage",
                    ideal_bonds - bonds_without_fee,
                )?,
                d_token_asset_fee: fee,
                d_base_asset_orders: 1,
                d_base_asset_volume: request.trade_amount,
                ..Default::default()
            },
            wallet_deltas: WalletDeltas {
                d_base: -request.trade_amount,
                d_longs: bonds_out,
                fees_paid: fee,
                ..Default::default()
            },
            breakdown: TradeBreakdown {
                without_fee_or_slippage: to_f64("without_fee_or_slippage", ideal_bonds)?,
                output_with_fee: bonds_out,
                output_without_fee: to_f64("output_without_fee", bonds_without_fee)?,
                fee,
            },
        })
    }

    fn close_long(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        let pool = Pool::from_request(request)?;
        let (breakdown, market_deltas) = pool.sell_bonds()?;
        Ok(TradeOutcome {
            market_deltas,
            wallet_deltas: WalletDeltas {
                d_base: breakdown.output_with_fee,
                d_longs: -request.trade_amount,
                fees_paid: breakdown.fee,
                ..Default::default()
            },
            breakdown,
        })
    }

    fn open_short(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        let pool = Pool::from_request(request)?;
        let (breakdown, market_deltas) = pool.sell_bonds()?;
        Ok(TradeOutcome {
            market_deltas,
            wallet_deltas: WalletDeltas {
                d_base: breakdown.output_with_fee - request.trade_amount,
                d_shorts: request.trade_amount,
                fees_paid: breakdown.fee,
                ..Default::default()
            },
            breakdown,
        })
    }

    fn close_short(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        let pool = Pool::from_request(request)?;

        let shares_with_fee = ConstantProductMath::calculate_input_amount(
            pool.amount,
            pool.share_reserves,
            pool.bond_reserves,
            pool.fee,
        )?;
        let shares_without_fee = ConstantProductMath::calculate_input_amount(
            pool.amount,
            pool.share_reserves,
            pool.bond_reserves,
            dec!(0),
        )?;
        let ideal_shares = ConstantProductMath::calculate_ideal_output(
            pool.amount,
            pool.bond_reserves,
            pool.share_reserves,
        )?;

        let base_with_fee = to_f64("output_with_fee", shares_with_fee * pool.share_price)?;
        let base_without_fee =
            to_f64("output_without_fee", shares_without_fee * pool.share_price)?;
        let ideal_base = to_f64("without_fee_or_slippage", ideal_shares * pool.share_price)?;
        let fee = to_f64(
            "fee",
            (shares_with_fee - shares_without_fee) * pool.share_price,
        )?;

        Ok(TradeOutcome {
            market_deltas: MarketDeltas {
                d_base_asset: to_f64("d_base_asset", shares_with_fee)?,
                d_token_asset: -request.trade_amount,
                d_base_asset_slippage: base_without_fee - ideal_base,
                d_base_asset_fee: fee,
                d_base_asset_orders: 1,
                d_base_asset_volume: base_with_fee,
                ..Default::default()
            },
            wallet_deltas: WalletDeltas {
                d_base: request.trade_amount - base_with_fee,
                d_shorts: -request.trade_amount,
                fees_paid: fee,
                ..Default::default()
            },
            breakdown: TradeBreakdown {
                without_fee_or_slippage: ideal_base,
                output_with_fee: base_with_fee,
                output_without_fee: base_without_fee,
                fee,
            },
        })
    }
}
