//! # Hyperdrive Market - Trade State Machine
//!
//! ## Purpose
//!
//! Owns the reserves, fee and time parameters and cumulative statistics of one
//! simulated fixed-rate pool. [`Market::swap`] is the only trade entry point:
//!
//! ```text
//! received → enriched → priced → applied → finalized
//! ```
//!
//! The request is stamped with a snapshot of market state, routed to exactly
//! one [`hyperdrive_amm::PricingModel`] routine, sanity checked, applied
//! atomically, and the trader's wallet deltas are handed back.
//!
//! ## Concurrency
//!
//! [`Market`] is single-threaded. Wrap it in a [`SharedMarket`] to serialize
//! mutation when more than one caller needs access.

pub mod error;
pub mod market;
pub mod shared;

pub use error::{FeeCheckReport, MarketError, Result};
pub use market::{Market, MarketParams, MarketStats};
pub use shared::SharedMarket;
