//! Concurrent access through the single-writer wrapper

use hyperdrive_amm::{ConstantProductPricingModel, HyperdrivePricingModel, MarketDeltas, TradeRequest};
use hyperdrive_market::{Market, MarketParams, SharedMarket};
use std::thread;

#[test]
fn test_concurrent_swaps_are_serialized() {
    let params = MarketParams::new(1_000_000.0, 1_000_000.0, 0.0, 0.5);
    let market = SharedMarket::new(Market::new(params, Box::new(ConstantProductPricingModel)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let market = market.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    market.swap(TradeRequest::open_long(10.0)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = market.stats();
    assert_eq!(stats.base_asset_orders, 200);
    assert!((stats.share_reserves - 1_002_000.0).abs() < 1e-6);
    assert!((stats.base_asset_volume - 2_000.0).abs() < 1e-9);
    // x*y=k with no fee holds across every interleaving
    let k = stats.share_reserves * stats.bond_reserves;
    assert!((k / 1e12 - 1.0).abs() < 1e-9);
}

#[test]
fn test_shared_mutators_and_reads() {
    let params = MarketParams::new(1_000_000.0, 1_000_000.0, 0.1, 0.5).with_time_stretch(22.186877016851916);
    let market = SharedMarket::new(Market::new(params, Box::new(HyperdrivePricingModel)).unwrap());

    market.tick(0.1);
    market.set_share_price(1.01).unwrap();
    market
        .update_market(&MarketDeltas {
            d_base_asset: 5.0,
            ..Default::default()
        })
        .unwrap();

    let stats = market.stats();
    assert_eq!(stats.time, 0.1);
    assert_eq!(stats.share_price, 1.01);
    assert_eq!(stats.share_reserves, 1_000_005.0);
    assert_eq!(market.with_market(|m| m.pricing_model_name()), "Hyperdrive");
    assert_eq!(
        market.get_market_state_string(),
        market.with_market(|m| m.get_market_state_string())
    );
}
