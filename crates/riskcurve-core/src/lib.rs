pub mod error;
pub mod types;

pub mod curve;
pub mod position;
pub mod pricing;
pub mod volatility;

pub use curve::generator::{generate_curves, try_generate_curves, CurveInput, CurveOutput};
pub use error::RiskCurveError;
pub use pricing::valuation::{implied_volatility, value_option};
pub use types::*;

/// Standard result type for all riskcurve operations
pub type RiskCurveResult<T> = Result<T, RiskCurveError>;
