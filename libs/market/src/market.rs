//! Market State Machine
//!
//! Holds the canonical pool state, routes each trade to exactly one pricing
//! model routine and applies the returned deltas atomically. The market never
//! computes curve math and never tracks individual wallets.

use crate::error::{FeeCheckReport, MarketError, Result};
use hyperdrive_amm::time::{stretch_time, time_remaining};
use hyperdrive_amm::{
    ActionType, MarketDeltas, MarketSnapshot, PricingModel, SpotPriceInputs, TokenType,
    TradeBreakdown, TradeDirection, TradeOutcome, TradeRequest, WalletDeltas,
    HYPERDRIVE_MODEL_NAME,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Construction parameters for a market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    pub share_reserves: f64,
    pub bond_reserves: f64,
    pub fee_percent: f64,
    /// Bond term as a year-fraction
    pub token_duration: f64,
    pub time_stretch_constant: f64,
    pub init_share_price: f64,
    pub share_price: f64,
}

impl MarketParams {
    pub fn new(share_reserves: f64, bond_reserves: f64, fee_percent: f64, token_duration: f64) -> Self {
        Self {
            share_reserves,
            bond_reserves,
            fee_percent,
            token_duration,
            time_stretch_constant: 1.0,
            init_share_price: 1.0,
            share_price: 1.0,
        }
    }

    pub fn with_time_stretch(mut self, time_stretch_constant: f64) -> Self {
        self.time_stretch_constant = time_stretch_constant;
        self
    }

    pub fn with_share_prices(mut self, init_share_price: f64, share_price: f64) -> Self {
        self.init_share_price = init_share_price;
        self.share_price = share_price;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("share_reserves", self.share_reserves),
            ("bond_reserves", self.bond_reserves),
            ("fee_percent", self.fee_percent),
            ("token_duration", self.token_duration),
            ("time_stretch_constant", self.time_stretch_constant),
            ("init_share_price", self.init_share_price),
            ("share_price", self.share_price),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(MarketError::InvalidParameter { name, value });
            }
        }

        if !(0.0..=1.0).contains(&self.fee_percent) {
            return Err(MarketError::InvalidParameter {
                name: "fee_percent",
                value: self.fee_percent,
            });
        }
        let positive = [
            ("token_duration", self.token_duration),
            ("time_stretch_constant", self.time_stretch_constant),
            ("init_share_price", self.init_share_price),
            ("share_price", self.share_price),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(MarketError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Read-only copy of every market field, for analytics collaborators
#[derive(Debug, Clone, Serialize)]
pub struct MarketStats {
    pub time: f64,
    pub share_reserves: f64,
    pub bond_reserves: f64,
    pub share_price: f64,
    pub base_asset_orders: u64,
    pub token_asset_orders: u64,
    pub base_asset_volume: f64,
    pub token_asset_volume: f64,
    pub cum_token_asset_slippage: f64,
    pub cum_base_asset_slippage: f64,
    pub cum_token_asset_fees: f64,
    pub cum_base_asset_fees: f64,
    pub spot_price: f64,
    pub total_supply: f64,
}

/// Simulated fixed-rate market
///
/// Mutated only through [`Market::swap`], [`Market::update_market`],
/// [`Market::tick`] and [`Market::set_share_price`].
pub struct Market {
    /// Elapsed time in year fractions
    time: f64,
    /// z
    share_reserves: f64,
    /// y
    bond_reserves: f64,
    /// g
    fee_percent: f64,
    /// μ, normalizing constant
    init_share_price: f64,
    /// c
    share_price: f64,
    token_duration: f64,
    pricing_model: Box<dyn PricingModel>,
    time_stretch_constant: f64,
    base_asset_orders: u64,
    token_asset_orders: u64,
    base_asset_volume: f64,
    token_asset_volume: f64,
    cum_token_asset_slippage: f64,
    cum_base_asset_slippage: f64,
    cum_token_asset_fees: f64,
    cum_base_asset_fees: f64,
    spot_price: f64,
    /// Reserves at construction; never refreshed
    total_supply: f64,
}

impl Market {
    pub fn new(params: MarketParams, pricing_model: Box<dyn PricingModel>) -> Result<Self> {
        params.validate()?;

        let mut market = Self {
            time: 0.0,
            share_reserves: params.share_reserves,
            bond_reserves: params.bond_reserves,
            fee_percent: params.fee_percent,
            init_share_price: params.init_share_price,
            share_price: params.share_price,
            token_duration: params.token_duration,
            pricing_model,
            time_stretch_constant: params.time_stretch_constant,
            base_asset_orders: 0,
            token_asset_orders: 0,
            base_asset_volume: 0.0,
            token_asset_volume: 0.0,
            cum_token_asset_slippage: 0.0,
            cum_base_asset_slippage: 0.0,
            cum_token_asset_fees: 0.0,
            cum_base_asset_fees: 0.0,
            spot_price: f64::NAN,
            total_supply: params.share_reserves + params.bond_reserves,
        };
        market.update_spot_price();

        debug!(
            pricing_model = market.pricing_model.model_name(),
            share_reserves = market.share_reserves,
            bond_reserves = market.bond_reserves,
            spot_price = market.spot_price,
            "Market initialized"
        );
        Ok(market)
    }

    /// Reserve the pricing model treats as the constrained side of a trade
    ///
    /// Supplying bonds: `In` targets bond reserves, `Out` targets share
    /// reserves. Supplying base it is the other way round.
    pub fn get_target_reserves(&self, token_in: TokenType, direction: TradeDirection) -> f64 {
        match (direction, token_in) {
            (TradeDirection::In, TokenType::Bond) => self.bond_reserves,
            (TradeDirection::In, TokenType::Base) => self.share_reserves,
            (TradeDirection::Out, TokenType::Bond) => self.share_reserves,
            (TradeDirection::Out, TokenType::Base) => self.bond_reserves,
        }
    }

    /// Reject quotes whose fee or outputs are not real numbers, or whose fee is negative
    ///
    /// A NaN here is the signature of a curve evaluated outside its domain,
    /// e.g. a fractional power of a negative reserve.
    pub fn check_fees(
        &self,
        amount: f64,
        tokens: (TokenType, TokenType),
        reserves: (f64, f64),
        trade_result: &TradeBreakdown,
    ) -> Result<()> {
        let not_real = [
            trade_result.output_with_fee,
            trade_result.output_without_fee,
            trade_result.fee,
        ]
        .iter()
        .any(|value| value.is_nan());

        if not_real || trade_result.fee < 0.0 {
            let (token_in, token_out) = tokens;
            let (in_reserves, out_reserves) = reserves;
            return Err(MarketError::InvalidTradeResult(Box::new(FeeCheckReport {
                token_in,
                token_out,
                in_reserves,
                out_reserves,
                trade_amount: amount,
                trade_result: *trade_result,
                market_state: self.get_market_state_string(),
            })));
        }
        Ok(())
    }

    /// Apply every delta, or none of them if any is not finite or a counter would overflow
    pub fn update_market(&mut self, market_deltas: &MarketDeltas) -> Result<()> {
        if let Some((field, value)) = market_deltas.first_non_finite() {
            return Err(MarketError::NonFiniteDelta { field, value });
        }
        let base_asset_orders = self
            .base_asset_orders
            .checked_add(market_deltas.d_base_asset_orders)
            .ok_or(MarketError::CounterOverflow {
                field: "base_asset_orders",
            })?;
        let token_asset_orders = self
            .token_asset_orders
            .checked_add(market_deltas.d_token_asset_orders)
            .ok_or(MarketError::CounterOverflow {
                field: "token_asset_orders",
            })?;

        self.share_reserves += market_deltas.d_base_asset;
        self.bond_reserves += market_deltas.d_token_asset;
        self.cum_base_asset_slippage += market_deltas.d_base_asset_slippage;
        self.cum_token_asset_slippage += market_deltas.d_token_asset_slippage;
        self.cum_base_asset_fees += market_deltas.d_base_asset_fee;
        self.cum_token_asset_fees += market_deltas.d_token_asset_fee;
        self.base_asset_orders = base_asset_orders;
        self.token_asset_orders = token_asset_orders;
        self.base_asset_volume += market_deltas.d_base_asset_volume;
        self.token_asset_volume += market_deltas.d_token_asset_volume;
        Ok(())
    }

    /// Parse an action name and execute it
    pub fn swap_action(
        &mut self,
        action_type: &str,
        trade_amount: f64,
        mint_time: Option<f64>,
    ) -> Result<WalletDeltas> {
        let action_type: ActionType = action_type.parse()?;
        let mut request = TradeRequest::new(action_type, trade_amount);
        request.mint_time = mint_time;
        self.swap(request)
    }

    /// Execute a trade in the simulated market
    pub fn swap(&mut self, mut request: TradeRequest) -> Result<WalletDeltas> {
        self.enrich(&mut request);

        let action = request.action_type;
        let (token_in, token_out, outcome) = self.route(&mut request).map_err(|source| {
            warn!(%action, amount = request.trade_amount, error = %source, "Pricing model rejected trade");
            MarketError::Pricing { action, source }
        })?;

        self.check_fees(
            request.trade_amount,
            (token_in, token_out),
            (self.reserves_of(token_in), self.reserves_of(token_out)),
            &outcome.breakdown,
        )?;

        self.update_market(&outcome.market_deltas)?;
        self.update_spot_price();

        if self.share_reserves < 0.0 || self.bond_reserves < 0.0 {
            warn!(
                %action,
                share_reserves = self.share_reserves,
                bond_reserves = self.bond_reserves,
                "Trade drove market reserves negative"
            );
        }
        debug!(
            %action,
            amount = request.trade_amount,
            share_reserves = self.share_reserves,
            bond_reserves = self.bond_reserves,
            spot_price = self.spot_price,
            "Trade applied"
        );

        Ok(outcome.wallet_deltas)
    }

    /// Stamp the request with the state the pricing model quotes against
    fn enrich(&self, request: &mut TradeRequest) {
        let remaining = match request.mint_time {
            Some(mint_time) if request.action_type.is_close() => {
                time_remaining(self.token_duration, mint_time, self.time)
            }
            _ => self.token_duration,
        };

        request.snapshot = Some(MarketSnapshot {
            fee_percent: self.fee_percent,
            init_share_price: self.init_share_price,
            share_price: self.share_price,
            share_reserves: self.share_reserves,
            bond_reserves: self.bond_reserves,
            time_remaining: remaining,
            stretched_time_remaining: stretch_time(remaining, self.time_stretch_constant),
        });
    }

    /// Assign direction and token roles, then call exactly one pricing routine
    fn route(
        &self,
        request: &mut TradeRequest,
    ) -> hyperdrive_amm::Result<(TokenType, TokenType, TradeOutcome)> {
        let (direction, token_in, token_out) = match request.action_type {
            // buy unknown bonds with known base
            ActionType::OpenLong => (TradeDirection::Out, TokenType::Base, TokenType::Bond),
            // sell known bonds for unknown base
            ActionType::CloseLong => (TradeDirection::Out, TokenType::Bond, TokenType::Base),
            ActionType::OpenShort => (TradeDirection::Out, TokenType::Bond, TokenType::Base),
            // buy back known bonds for unknown base
            ActionType::CloseShort => (TradeDirection::In, TokenType::Base, TokenType::Bond),
        };
        request.direction = Some(direction);
        request.token_in = Some(token_in);
        request.token_out = Some(token_out);

        debug!(action = %request.action_type, %direction, %token_in, %token_out, "Routing trade");
        let outcome = match request.action_type {
            ActionType::OpenLong => self.pricing_model.open_long(request),
            ActionType::CloseLong => self.pricing_model.close_long(request),
            ActionType::OpenShort => self.pricing_model.open_short(request),
            ActionType::CloseShort => self.pricing_model.close_short(request),
        }?;
        Ok((token_in, token_out, outcome))
    }

    fn reserves_of(&self, token: TokenType) -> f64 {
        match token {
            TokenType::Base => self.share_reserves,
            TokenType::Bond => self.bond_reserves,
        }
    }

    /// Every field as a `name = value` line, in declaration order
    pub fn get_market_state_string(&self) -> String {
        let lines = [
            format!("time = {}", self.time),
            format!("share_reserves = {}", self.share_reserves),
            format!("bond_reserves = {}", self.bond_reserves),
            format!("fee_percent = {}", self.fee_percent),
            format!("init_share_price = {}", self.init_share_price),
            format!("share_price = {}", self.share_price),
            format!("token_duration = {}", self.token_duration),
            format!("pricing_model = {}", self.pricing_model.model_name()),
            format!("time_stretch_constant = {}", self.time_stretch_constant),
            format!("base_asset_orders = {}", self.base_asset_orders),
            format!("token_asset_orders = {}", self.token_asset_orders),
            format!("base_asset_volume = {}", self.base_asset_volume),
            format!("token_asset_volume = {}", self.token_asset_volume),
            format!("cum_token_asset_slippage = {}", self.cum_token_asset_slippage),
            format!("cum_base_asset_slippage = {}", self.cum_base_asset_slippage),
            format!("cum_token_asset_fees = {}", self.cum_token_asset_fees),
            format!("cum_base_asset_fees = {}", self.cum_base_asset_fees),
            format!("spot_price = {}", self.spot_price),
            format!("total_supply = {}", self.total_supply),
        ];
        lines.join("\n")
    }

    /// Advance simulated time; negative values move it backwards
    pub fn tick(&mut self, delta_time: f64) {
        self.time += delta_time;
    }

    /// Update the share price from outside the market, e.g. vault accrual
    pub fn set_share_price(&mut self, share_price: f64) -> Result<()> {
        if !share_price.is_finite() || share_price <= 0.0 {
            return Err(MarketError::InvalidParameter {
                name: "share_price",
                value: share_price,
            });
        }
        self.share_price = share_price;
        self.update_spot_price();
        Ok(())
    }

    pub fn update_spot_price(&mut self) {
        self.spot_price = if self.pricing_model.model_name() == HYPERDRIVE_MODEL_NAME {
            self.pricing_model.calc_spot_price(SpotPriceInputs {
                share_reserves: self.share_reserves,
                bond_reserves: self.bond_reserves,
                init_share_price: self.init_share_price,
                share_price: self.share_price,
                time_remaining: stretch_time(self.token_duration, self.time_stretch_constant),
            })
        } else {
            f64::NAN
        };
    }

    pub fn stats(&self) -> MarketStats {
        MarketStats {
            time: self.time,
            share_reserves: self.share_reserves,
            bond_reserves: self.bond_reserves,
            share_price: self.share_price,
            base_asset_orders: self.base_asset_orders,
            token_asset_orders: self.token_asset_orders,
            base_asset_volume: self.base_asset_volume,
            token_asset_volume: self.token_asset_volume,
            cum_token_asset_slippage: self.cum_token_asset_slippage,
            cum_base_asset_slippage: self.cum_base_asset_slippage,
            cum_token_asset_fees: self.cum_token_asset_fees,
            cum_base_asset_fees: self.cum_base_asset_fees,
            spot_price: self.spot_price,
            total_supply: self.total_supply,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn share_reserves(&self) -> f64 {
        self.share_reserves
    }

    pub fn bond_reserves(&self) -> f64 {
        self.bond_reserves
    }

    pub fn fee_percent(&self) -> f64 {
        self.fee_percent
    }

    pub fn init_share_price(&self) -> f64 {
        self.init_share_price
    }

    pub fn share_price(&self) -> f64 {
        self.share_price
    }

    pub fn token_duration(&self) -> f64 {
        self.token_duration
    }

    pub fn time_stretch_constant(&self) -> f64 {
        self.time_stretch_constant
    }

    pub fn pricing_model_name(&self) -> &'static str {
        self.pricing_model.model_name()
    }

    pub fn base_asset_orders(&self) -> u64 {
        self.base_asset_orders
    }

    pub fn token_asset_orders(&self) -> u64 {
        self.token_asset_orders
    }

    pub fn base_asset_volume(&self) -> f64 {
        self.base_asset_volume
    }

    pub fn token_asset_volume(&self) -> f64 {
        self.token_asset_volume
    }

    pub fn cum_base_asset_slippage(&self) -> f64 {
        self.cum_base_asset_slippage
    }

    pub fn cum_token_asset_slippage(&self) -> f64 {
        self.cum_token_asset_slippage
    }

    pub fn cum_base_asset_fees(&self) -> f64 {
        self.cum_base_asset_fees
    }

    pub fn cum_token_asset_fees(&self) -> f64 {
        self.cum_token_asset_fees
    }

    pub fn spot_price(&self) -> f64 {
        self.spot_price
    }

    pub fn total_supply(&self) -> f64 {
        self.total_supply
    }
}

impl std::fmt::Debug for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Market")
            .field("time", &self.time)
            .field("share_reserves", &self.share_reserves)
            .field("bond_reserves", &self.bond_reserves)
            .field("pricing_model", &self.pricing_model.model_name())
            .field("spot_price", &self.spot_price)
            .finish_non_exhaustive()
    }
}
