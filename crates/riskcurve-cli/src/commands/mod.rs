pub mod curves;
pub mod pricing;
pub mod regimes;
