//! Market error types
//!
//! Every variant is a precondition violation or routing bug: the trade in
//! flight is aborted and the market keeps its last applied state.

use hyperdrive_amm::{ActionType, ParseActionTypeError, PricingError, TokenType, TradeBreakdown};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Invalid market parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Market delta {field} is not finite: {value}")]
    NonFiniteDelta { field: &'static str, value: f64 },

    #[error("Order counter {field} would overflow")]
    CounterOverflow { field: &'static str },

    #[error("Unknown trade type \"{0}\"")]
    UnknownTradeType(String),

    #[error("{0}")]
    InvalidTradeResult(Box<FeeCheckReport>),

    #[error("Pricing model rejected {action}: {source}")]
    Pricing {
        action: ActionType,
        #[source]
        source: PricingError,
    },
}

impl From<ParseActionTypeError> for MarketError {
    fn from(err: ParseActionTypeError) -> Self {
        MarketError::UnknownTradeType(err.0)
    }
}

/// Result type alias for market operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// Post-mortem payload for a quote that failed the fee sanity check
#[derive(Debug, Clone, PartialEq)]
pub struct FeeCheckReport {
    pub token_in: TokenType,
    pub token_out: TokenType,
    pub in_reserves: f64,
    pub out_reserves: f64,
    pub trade_amount: f64,
    pub trade_result: TradeBreakdown,
    /// Full market state dump at failure time
    pub market_state: String,
}

impl fmt::Display for FeeCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Market.check_fees: Error: fee={} should not be < 0 and should be a real number.",
            self.trade_result.fee
        )?;
        writeln!(f, "token_in = {}", self.token_in)?;
        writeln!(f, "token_out = {}", self.token_out)?;
        writeln!(f, "in_reserves = {}", self.in_reserves)?;
        writeln!(f, "out_reserves = {}", self.out_reserves)?;
        writeln!(f, "trade_amount = {}", self.trade_amount)?;
        writeln!(
            f,
            "without_fee_or_slippage = {}",
            self.trade_result.without_fee_or_slippage
        )?;
        writeln!(f, "output_with_fee = {}", self.trade_result.output_with_fee)?;
        writeln!(f, "output_without_fee = {}", self.trade_result.output_without_fee)?;
        writeln!(f, "fee = {}", self.trade_result.fee)?;
        write!(f, "{}", self.market_state)
    }
}
