//! Value types crossing the market / pricing model boundary
//!
//! A [`TradeRequest`] flows into the market, gets stamped with a
//! [`MarketSnapshot`] and routed, and the pricing model answers with a
//! [`TradeOutcome`]: the deltas the market applies, the deltas handed back to
//! the trader, and the raw quote used for fee sanity checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The four trades a fixed-rate market supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Buy bonds with a known amount of base
    OpenLong,
    /// Sell a known amount of bonds for base
    CloseLong,
    /// Sell a known amount of bonds into the pool for base
    OpenShort,
    /// Buy back a known amount of bonds with base
    CloseShort,
}

impl ActionType {
    pub const ALL: [ActionType; 4] = [
        ActionType::OpenLong,
        ActionType::CloseLong,
        ActionType::OpenShort,
        ActionType::CloseShort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::OpenLong => "open_long",
            ActionType::CloseLong => "close_long",
            ActionType::OpenShort => "open_short",
            ActionType::CloseShort => "close_short",
        }
    }

    /// Close actions settle an existing position and carry a mint time
    pub fn is_close(&self) -> bool {
        matches!(self, ActionType::CloseLong | ActionType::CloseShort)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an action string names none of the four trades
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown trade type \"{0}\"")]
pub struct ParseActionTypeError(pub String);

impl FromStr for ActionType {
    type Err = ParseActionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open_long" => Ok(ActionType::OpenLong),
            "close_long" => Ok(ActionType::CloseLong),
            "open_short" => Ok(ActionType::OpenShort),
            "close_short" => Ok(ActionType::CloseShort),
            other => Err(ParseActionTypeError(other.to_string())),
        }
    }
}

/// Which side of the trade amount is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    /// Known output, solve for input (calcInGivenOut)
    In,
    /// Known input, solve for output (calcOutGivenIn)
    Out,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::In => "in",
            TradeDirection::Out => "out",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two assets of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Base asset, held by the pool as interest-bearing shares
    Base,
    /// Fixed-maturity bond ("pt", formerly "fyt")
    Bond,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Base => "base",
            TokenType::Bond => "pt",
        }
    }

    /// Classify a legacy token label; only the bond labels map to `Bond`
    pub fn from_label(label: &str) -> Self {
        match label {
            "fyt" | "pt" | "bond" => TokenType::Bond,
            _ => TokenType::Base,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only copy of the market state a pricing routine quotes against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub fee_percent: f64,
    pub init_share_price: f64,
    pub share_price: f64,
    pub share_reserves: f64,
    pub bond_reserves: f64,
    /// Year-fraction left until the traded bonds mature
    pub time_remaining: f64,
    /// `time_remaining` after the time stretch transform
    pub stretched_time_remaining: f64,
}

/// One trade as requested by a caller and enriched by the market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub action_type: ActionType,
    pub trade_amount: f64,
    /// Mint time of the position being closed, in market time
    pub mint_time: Option<f64>,
    pub direction: Option<TradeDirection>,
    pub token_in: Option<TokenType>,
    pub token_out: Option<TokenType>,
    pub snapshot: Option<MarketSnapshot>,
}

impl TradeRequest {
    pub fn new(action_type: ActionType, trade_amount: f64) -> Self {
        Self {
            action_type,
            trade_amount,
            mint_time: None,
            direction: None,
            token_in: None,
            token_out: None,
            snapshot: None,
        }
    }

    pub fn open_long(trade_amount: f64) -> Self {
        Self::new(ActionType::OpenLong, trade_amount)
    }

    pub fn close_long(trade_amount: f64, mint_time: f64) -> Self {
        Self::new(ActionType::CloseLong, trade_amount).with_mint_time(mint_time)
    }

    pub fn open_short(trade_amount: f64) -> Self {
        Self::new(ActionType::OpenShort, trade_amount)
    }

    pub fn close_short(trade_amount: f64, mint_time: f64) -> Self {
        Self::new(ActionType::CloseShort, trade_amount).with_mint_time(mint_time)
    }

    pub fn with_mint_time(mut self, mint_time: f64) -> Self {
        self.mint_time = Some(mint_time);
        self
    }
}

/// Signed adjustments to every cumulative market field
///
/// `d_base_asset` moves share reserves and `d_token_asset` moves bond
/// reserves. Order counts are unsigned; all float fields must be finite
/// before a market will apply them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketDeltas {
    pub d_base_asset: f64,
    pub d_token_asset: f64,
    pub d_base_asset_slippage: f64,
    pub d_token_asset_slippage: f64,
    pub d_base_asset_fee: f64,
    pub d_token_asset_fee: f64,
    pub d_base_asset_orders: u64,
    pub d_token_asset_orders: u64,
    pub d_base_asset_volume: f64,
    pub d_token_asset_volume: f64,
}

impl MarketDeltas {
    /// Named view over the float fields, in declaration order
    pub fn float_fields(&self) -> [(&'static str, f64); 8] {
        [
            ("d_base_asset", self.d_base_asset),
            ("d_token_asset", self.d_token_asset),
            ("d_base_asset_slippage", self.d_base_asset_slippage),
            ("d_token_asset_slippage", self.d_token_asset_slippage),
            ("d_base_asset_fee", self.d_base_asset_fee),
            ("d_token_asset_fee", self.d_token_asset_fee),
            ("d_base_asset_volume", self.d_base_asset_volume),
            ("d_token_asset_volume", self.d_token_asset_volume),
        ]
    }

    /// First field holding NaN or an infinity, if any
    pub fn first_non_finite(&self) -> Option<(&'static str, f64)> {
        self.float_fields()
            .into_iter()
            .find(|(_, value)| !value.is_finite())
    }
}

/// Position and balance changes for the trader; the market never reads these
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletDeltas {
    pub d_base: f64,
    pub d_longs: f64,
    pub d_shorts: f64,
    pub fees_paid: f64,
}

/// Raw quote behind a trade, checked for sanity before it is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeBreakdown {
    /// Output at the spot price with no fee and no curve slippage
    pub without_fee_or_slippage: f64,
    pub output_with_fee: f64,
    pub output_without_fee: f64,
    pub fee: f64,
}

/// Everything a pricing routine returns for one trade
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TradeOutcome {
    pub market_deltas: MarketDeltas,
    pub wallet_deltas: WalletDeltas,
    pub breakdown: TradeBreakdown,
}

/// Inputs for a marginal price quote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotPriceInputs {
    pub share_reserves: f64,
    pub bond_reserves: f64,
    pub init_share_price: f64,
    pub share_price: f64,
    /// Stretched time remaining
    pub time_remaining: f64,
}
