//! Pricing model trait definitions for a unified curve interface

use crate::error::Result;
use crate::types::{SpotPriceInputs, TradeOutcome, TradeRequest};
use crate::{ConstantProductPricingModel, HyperdrivePricingModel};
use serde::{Deserialize, Serialize};

/// Model name that enables spot price tracking in the market
pub const HYPERDRIVE_MODEL_NAME: &str = "Hyperdrive";

/// Curve variant identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModelKind {
    Hyperdrive,
    ConstantProduct,
}

impl PricingModelKind {
    /// Construct the matching curve
    pub fn build(&self) -> Box<dyn PricingModel> {
        match self {
            PricingModelKind::Hyperdrive => Box::new(HyperdrivePricingModel),
            PricingModelKind::ConstantProduct => Box::new(ConstantProductPricingModel),
        }
    }
}

/// Curve capability the market delegates all trade math to
///
/// Every routine receives a request already stamped with a market snapshot
/// and must not assume anything about the market beyond it.
pub trait PricingModel: Send {
    /// Identifies the curve variant
    fn model_name(&self) -> &'static str;

    /// Known base in, bonds out
    fn open_long(&self, request: &TradeRequest) -> Result<TradeOutcome>;

    /// Known bonds in, base out
    fn close_long(&self, request: &TradeRequest) -> Result<TradeOutcome>;

    /// Known bonds sold to the pool, base out
    fn open_short(&self, request: &TradeRequest) -> Result<TradeOutcome>;

    /// Known bonds bought back from the pool, base in
    fn close_short(&self, request: &TradeRequest) -> Result<TradeOutcome>;

    /// Marginal base-per-bond price; curves without one return NaN
    fn calc_spot_price(&self, _inputs: SpotPriceInputs) -> f64 {
        f64::NAN
    }
}

impl<P: PricingModel + ?Sized> PricingModel for Box<P> {
    fn model_name(&self) -> &'static str {
        (**self).model_name()
    }

    fn open_long(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        (**self).open_long(request)
    }

    fn close_long(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        (**self).close_long(request)
    }

    fn open_short(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        (**self).open_short(request)
    }

    fn close_short(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        (**self).close_short(request)
    }

    fn calc_spot_price(&self, inputs: SpotPriceInputs) -> f64 {
        (**self).calc_spot_price(inputs)
    }
}
