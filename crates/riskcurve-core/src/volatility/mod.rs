pub mod regime;
pub mod skew;

pub use regime::{regime_table, MarketRegime, RegimeConfig};
pub use skew::skewed_volatility;
