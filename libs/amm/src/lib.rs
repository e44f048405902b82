//! # Hyperdrive AMM Library - Pricing Models for Fixed-Rate Markets
//!
//! ## Purpose
//!
//! Curve mathematics for a bonded, time-decaying fixed-rate market. Every curve
//! implements the [`PricingModel`] capability: given a trade request stamped
//! with a market snapshot, it quotes the market deltas, the trader's wallet
//! deltas and the raw fee/slippage breakdown, without touching market state.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Enriched [`TradeRequest`]s from the market state machine
//! - **Output Destinations**: [`TradeOutcome`]s applied by the market and passed to wallets
//! - **Curves**: Hyperdrive (YieldSpace with time stretch), constant product (x·y=k)
//! - **Precision**: f64 at the boundary; the constant product curve computes in `Decimal`
//!
//! ## Architecture Role
//!
//! ```text
//! Caller ──TradeRequest──▶ Market ──enriched request──▶ PricingModel
//!                            ▲                              │
//!                            └──── TradeOutcome (deltas) ◀──┘
//! ```
//!
//! The market never implements curve math itself; it only routes and applies.

pub mod constant_product;
pub mod error;
pub mod hyperdrive;
pub mod pricing_model;
pub mod time;
pub mod types;

pub use constant_product::{ConstantProductMath, ConstantProductPricingModel};
pub use error::{PricingError, Result};
pub use hyperdrive::HyperdrivePricingModel;
pub use pricing_model::{PricingModel, PricingModelKind, HYPERDRIVE_MODEL_NAME};
pub use time::stretch_time;
pub use types::{
    ActionType, MarketDeltas, MarketSnapshot, ParseActionTypeError, SpotPriceInputs, TokenType,
    TradeBreakdown, TradeDirection, TradeOutcome, TradeRequest, WalletDeltas,
};
