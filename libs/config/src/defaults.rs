//! Simulation defaults
//!
//! Default values shared by the config structs and the simulator so a run
//! without a config file is still a sensible one.

/// Market defaults
pub mod market {
    pub const SHARE_RESERVES: f64 = 1_000_000.0;
    pub const BOND_RESERVES: f64 = 1_000_000.0;

    /// Fee as a fraction of implied interest
    pub const FEE_PERCENT: f64 = 0.1;

    /// 180 day bond term
    pub const TOKEN_DURATION_DAYS: f64 = 180.0;

    /// Stretch tuned for a ~5% target rate
    pub const TIME_STRETCH_CONSTANT: f64 = 22.186877016851916;

    pub const INIT_SHARE_PRICE: f64 = 1.0;
    pub const SHARE_PRICE: f64 = 1.0;
}

/// Trade loop defaults
pub mod simulation {
    pub const NUM_TRADING_DAYS: u32 = 90;
    pub const RANDOM_SEED: u64 = 123;

    /// Yield earned by the underlying vault, applied to the share price daily
    pub const VAULT_APR: f64 = 0.05;
}

/// Agent defaults
pub mod agents {
    pub const BUDGET_MEAN: f64 = 5_000.0;
    pub const BUDGET_STD: f64 = 2_000.0;
    pub const BUDGET_MIN: f64 = 1_000.0;
    pub const BUDGET_MAX: f64 = 10_000.0;

    /// Probability an agent trades on a given day
    pub const TRADE_CHANCE: f64 = 0.5;
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";
}
