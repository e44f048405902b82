//! Swap dispatch tests against a recording pricing model

use hyperdrive_amm::{
    ActionType, HyperdrivePricingModel, MarketDeltas, PricingError, PricingModel, TokenType,
    TradeBreakdown, TradeDirection, TradeOutcome, TradeRequest, WalletDeltas,
};
use hyperdrive_market::{Market, MarketError, MarketParams};
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything the recording model saw for one call
#[derive(Debug, Clone)]
struct RecordedCall {
    routine: &'static str,
    request: TradeRequest,
}

/// Moves `trade_amount` between reserves with no fee or slippage
#[derive(Clone, Default)]
struct RecordingModel {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    next_deltas: Arc<Mutex<Option<MarketDeltas>>>,
    next_breakdown: Arc<Mutex<Option<TradeBreakdown>>>,
}

impl RecordingModel {
    fn record(&self, routine: &'static str, request: &TradeRequest, base_side: bool) -> TradeOutcome {
        self.calls.lock().push(RecordedCall {
            routine,
            request: request.clone(),
        });

        let amount = request.trade_amount;
        let default_deltas = if base_side {
            MarketDeltas {
                d_base_asset: amount,
                d_token_asset: -amount,
                d_base_asset_orders: 1,
                d_base_asset_volume: amount,
                ..Default::default()
            }
        } else {
            MarketDeltas {
                d_base_asset: -amount,
                d_token_asset: amount,
                d_token_asset_orders: 1,
                d_token_asset_volume: amount,
                ..Default::default()
            }
        };

        TradeOutcome {
            market_deltas: self.next_deltas.lock().take().unwrap_or(default_deltas),
            wallet_deltas: WalletDeltas {
                d_base: -amount,
                ..Default::default()
            },
            breakdown: self.next_breakdown.lock().take().unwrap_or(TradeBreakdown {
                without_fee_or_slippage: amount,
                output_with_fee: amount,
                output_without_fee: amount,
                fee: 0.0,
            }),
        }
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

impl PricingModel for RecordingModel {
    fn model_name(&self) -> &'static str {
        "Recording"
    }

    fn open_long(&self, request: &TradeRequest) -> hyperdrive_amm::Result<TradeOutcome> {
        Ok(self.record("open_long", request, true))
    }

    fn close_long(&self, request: &TradeRequest) -> hyperdrive_amm::Result<TradeOutcome> {
        Ok(self.record("close_long", request, false))
    }

    fn open_short(&self, request: &TradeRequest) -> hyperdrive_amm::Result<TradeOutcome> {
        Ok(self.record("open_short", request, false))
    }

    fn close_short(&self, request: &TradeRequest) -> hyperdrive_amm::Result<TradeOutcome> {
        Ok(self.record("close_short", request, true))
    }
}

fn market_with(model: &RecordingModel) -> Market {
    let params = MarketParams::new(100.0, 100.0, 0.0, 0.5).with_share_prices(1.0, 1.0);
    Market::new(params, Box::new(model.clone())).unwrap()
}

#[test]
fn test_open_long_concrete_scenario() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);

    let wallet = market.swap(TradeRequest::open_long(10.0)).unwrap();

    assert_eq!(wallet.d_base, -10.0);
    assert_eq!(market.share_reserves(), 110.0);
    assert_eq!(market.bond_reserves(), 90.0);
    assert_eq!(market.base_asset_orders(), 1);
    assert_eq!(market.token_asset_orders(), 0);
    assert_eq!(market.base_asset_volume(), 10.0);
    assert_eq!(market.cum_base_asset_fees(), 0.0);
    assert_eq!(market.cum_base_asset_slippage(), 0.0);
    // snapshot taken at construction
    assert_eq!(market.total_supply(), 200.0);
}

#[test]
fn test_routing_for_every_action() {
    let expected = [
        (ActionType::OpenLong, "open_long", TradeDirection::Out, TokenType::Base, TokenType::Bond),
        (ActionType::CloseLong, "close_long", TradeDirection::Out, TokenType::Bond, TokenType::Base),
        (ActionType::OpenShort, "open_short", TradeDirection::Out, TokenType::Bond, TokenType::Base),
        (ActionType::CloseShort, "close_short", TradeDirection::In, TokenType::Base, TokenType::Bond),
    ];

    for (action, routine, direction, token_in, token_out) in expected {
        let model = RecordingModel::default();
        let mut market = market_with(&model);
        market.swap(TradeRequest::new(action, 5.0)).unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 1, "{action} should price exactly once");
        assert_eq!(calls[0].routine, routine);

        let request = &calls[0].request;
        assert_eq!(request.direction, Some(direction));
        assert_eq!(request.token_in, Some(token_in));
        assert_eq!(request.token_out, Some(token_out));
    }
}

#[test]
fn test_request_enriched_with_pre_trade_state() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);
    market.swap(TradeRequest::open_long(10.0)).unwrap();
    market.swap(TradeRequest::open_long(10.0)).unwrap();

    let calls = model.calls();
    let first = calls[0].request.snapshot.unwrap();
    let second = calls[1].request.snapshot.unwrap();
    assert_eq!(first.share_reserves, 100.0);
    assert_eq!(first.bond_reserves, 100.0);
    assert_eq!(second.share_reserves, 110.0);
    assert_eq!(second.bond_reserves, 90.0);
    assert_eq!(second.fee_percent, 0.0);
    assert_eq!(second.init_share_price, 1.0);
    assert_eq!(second.share_price, 1.0);
}

#[test]
fn test_unknown_action_leaves_state_unchanged() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);
    let before = market.get_market_state_string();

    let err = market.swap_action("add_liquidity", 10.0, None).unwrap_err();

    match err {
        MarketError::UnknownTradeType(action) => assert_eq!(action, "add_liquidity"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(model.calls().is_empty());
    assert_eq!(market.get_market_state_string(), before);
}

#[test]
fn test_swap_action_parses_known_actions() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);
    market.swap_action("close_short", 3.0, Some(0.0)).unwrap();

    let calls = model.calls();
    assert_eq!(calls[0].routine, "close_short");
    assert_eq!(calls[0].request.mint_time, Some(0.0));
}

#[test]
fn test_non_finite_delta_is_atomic() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);
    let before = market.get_market_state_string();

    *model.next_deltas.lock() = Some(MarketDeltas {
        d_base_asset: 5.0,
        d_token_asset: f64::NAN,
        d_base_asset_orders: 1,
        ..Default::default()
    });
    let err = market.swap(TradeRequest::open_long(5.0)).unwrap_err();

    assert!(matches!(
        err,
        MarketError::NonFiniteDelta { field: "d_token_asset", .. }
    ));
    assert_eq!(market.get_market_state_string(), before);
    assert_eq!(market.base_asset_orders(), 0);
}

#[test]
fn test_update_market_rejects_infinity_without_mutation() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);
    let before = market.get_market_state_string();

    let deltas = MarketDeltas {
        d_base_asset: 1.0,
        d_token_asset_volume: f64::NEG_INFINITY,
        ..Default::default()
    };
    let err = market.update_market(&deltas).unwrap_err();

    assert!(matches!(
        err,
        MarketError::NonFiniteDelta { field: "d_token_asset_volume", value } if value == f64::NEG_INFINITY
    ));
    assert_eq!(market.get_market_state_string(), before);
}

#[test]
fn test_order_counter_overflow_is_atomic() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);
    market.swap(TradeRequest::open_long(10.0)).unwrap();
    let before = market.get_market_state_string();

    let err = market
        .update_market(&MarketDeltas {
            d_base_asset: 5.0,
            d_base_asset_orders: u64::MAX,
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(
        err,
        MarketError::CounterOverflow { field: "base_asset_orders" }
    ));
    assert_eq!(market.share_reserves(), 110.0);
    assert_eq!(market.base_asset_orders(), 1);
    assert_eq!(market.get_market_state_string(), before);

    // token side is checked before anything is applied too
    market.update_market(&MarketDeltas {
        d_token_asset_orders: u64::MAX,
        ..Default::default()
    })
    .unwrap();
    let err = market
        .update_market(&MarketDeltas {
            d_token_asset: -1.0,
            d_token_asset_orders: 1,
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        MarketError::CounterOverflow { field: "token_asset_orders" }
    ));
    assert_eq!(market.bond_reserves(), 90.0);
}

#[test]
fn test_update_market_applies_every_field() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);

    market
        .update_market(&MarketDeltas {
            d_base_asset: 1.0,
            d_token_asset: -2.0,
            d_base_asset_slippage: 0.1,
            d_token_asset_slippage: 0.2,
            d_base_asset_fee: 0.3,
            d_token_asset_fee: 0.4,
            d_base_asset_orders: 2,
            d_token_asset_orders: 3,
            d_base_asset_volume: 5.0,
            d_token_asset_volume: 6.0,
        })
        .unwrap();

    assert_eq!(market.share_reserves(), 101.0);
    assert_eq!(market.bond_reserves(), 98.0);
    assert_eq!(market.cum_base_asset_slippage(), 0.1);
    assert_eq!(market.cum_token_asset_slippage(), 0.2);
    assert_eq!(market.cum_base_asset_fees(), 0.3);
    assert_eq!(market.cum_token_asset_fees(), 0.4);
    assert_eq!(market.base_asset_orders(), 2);
    assert_eq!(market.token_asset_orders(), 3);
    assert_eq!(market.base_asset_volume(), 5.0);
    assert_eq!(market.token_asset_volume(), 6.0);
}

#[test]
fn test_negative_fee_quote_is_rejected_before_mutation() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);
    let before = market.get_market_state_string();

    *model.next_breakdown.lock() = Some(TradeBreakdown {
        without_fee_or_slippage: 10.0,
        output_with_fee: 10.5,
        output_without_fee: 10.0,
        fee: -0.5,
    });
    let err = market.swap(TradeRequest::close_long(10.0, 0.0)).unwrap_err();

    let MarketError::InvalidTradeResult(report) = err else {
        panic!("expected fee check failure");
    };
    assert_eq!(report.token_in, TokenType::Bond);
    assert_eq!(report.token_out, TokenType::Base);
    assert_eq!(report.in_reserves, 100.0);
    assert_eq!(report.out_reserves, 100.0);
    assert_eq!(report.market_state, before);
    assert_eq!(market.get_market_state_string(), before);
}

#[test]
fn test_pricing_error_surfaces_with_action() {
    struct RejectingModel;

    impl PricingModel for RejectingModel {
        fn model_name(&self) -> &'static str {
            "Rejecting"
        }
        fn open_long(&self, _: &TradeRequest) -> hyperdrive_amm::Result<TradeOutcome> {
            Err(PricingError::InsufficientLiquidity {
                reason: "empty".to_string(),
            })
        }
        fn close_long(&self, _: &TradeRequest) -> hyperdrive_amm::Result<TradeOutcome> {
            unimplemented!()
        }
        fn open_short(&self, _: &TradeRequest) -> hyperdrive_amm::Result<TradeOutcome> {
            unimplemented!()
        }
        fn close_short(&self, _: &TradeRequest) -> hyperdrive_amm::Result<TradeOutcome> {
            unimplemented!()
        }
    }

    let params = MarketParams::new(100.0, 100.0, 0.0, 0.5);
    let mut market = Market::new(params, Box::new(RejectingModel)).unwrap();
    let err = market.swap(TradeRequest::open_long(1.0)).unwrap_err();

    assert!(matches!(
        err,
        MarketError::Pricing {
            action: ActionType::OpenLong,
            source: PricingError::InsufficientLiquidity { .. }
        }
    ));
    assert_eq!(market.share_reserves(), 100.0);
}

#[test]
fn test_spot_price_gating() {
    let model = RecordingModel::default();
    let mut market = market_with(&model);
    for action in ActionType::ALL {
        market.swap(TradeRequest::new(action, 1.0)).unwrap();
        assert!(market.spot_price().is_nan());
    }

    let params = MarketParams::new(1_000_000.0, 1_000_000.0, 0.1, 0.5).with_time_stretch(22.186877016851916);
    let mut first = Market::new(params, Box::new(HyperdrivePricingModel)).unwrap();
    let mut second = Market::new(params, Box::new(HyperdrivePricingModel)).unwrap();

    first.swap(TradeRequest::open_long(1_000.0)).unwrap();
    second.swap(TradeRequest::open_long(1_000.0)).unwrap();

    assert!(first.spot_price().is_finite());
    assert_eq!(first.spot_price(), second.spot_price());

    let recomputed = HyperdrivePricingModel.calc_spot_price(hyperdrive_amm::SpotPriceInputs {
        share_reserves: first.share_reserves(),
        bond_reserves: first.bond_reserves(),
        init_share_price: first.init_share_price(),
        share_price: first.share_price(),
        time_remaining: hyperdrive_amm::stretch_time(
            first.token_duration(),
            first.time_stretch_constant(),
        ),
    });
    assert_eq!(first.spot_price(), recomputed);
}
