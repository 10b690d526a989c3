pub mod evaluator;
pub mod greeks;
pub mod legacy;
pub mod time;
pub mod types;

pub use evaluator::{
    expiration_pnl, is_expired, theoretical_pnl, PricingContext, DEFAULT_CALENDAR_VOLATILITY,
};
pub use greeks::strategy_greeks;
pub use legacy::LegacyShape;
pub use types::{normalize_strategies, Leg, PositionLeg, Strategy, StrategyInput, StrategyStructure};
