//! Error types for pricing model calculations

use thiserror::Error;

/// Errors a pricing model can return while quoting a trade
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PricingError {
    /// The request reached a pricing routine before the market stamped it
    #[error("Trade request is missing its market snapshot")]
    MissingSnapshot,

    /// Trade amount is negative or not a real number
    #[error("Invalid trade amount: {amount}")]
    InvalidAmount { amount: f64 },

    /// The curve cannot fill the trade from the available reserves
    #[error("Insufficient liquidity: {reason}")]
    InsufficientLiquidity { reason: String },

    /// An intermediate curve quantity stopped being a real number
    #[error("Non-finite value for {quantity}: {value}")]
    NonFinite { quantity: &'static str, value: f64 },

    /// Stretched time remaining outside the `[0, 1)` range the curve exponent needs
    #[error("Invalid stretched time remaining: {value}")]
    InvalidTimeRemaining { value: f64 },

    /// Conversion between f64 and exact decimal arithmetic failed
    #[error("Cannot represent {value} as an exact decimal")]
    Conversion { value: f64 },
}

/// Result type alias for pricing operations
pub type Result<T> = std::result::Result<T, PricingError>;
