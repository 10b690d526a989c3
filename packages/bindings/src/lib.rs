use napi::Result as NapiResult;
use napi_derive::napi;

use riskcurve_core::pricing::valuation::{ImpliedVolInput, OptionValuationInput};
use riskcurve_core::CurveInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// Recomputed on every chart interaction. Engine failures come back as the
/// empty chart shape; only malformed JSON is an error.
#[napi]
pub fn generate_curves(input_json: String) -> NapiResult<String> {
    let input: CurveInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = riskcurve_core::generate_curves(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Single-option pricing
// ---------------------------------------------------------------------------

#[napi]
pub fn value_option(input_json: String) -> NapiResult<String> {
    let input: OptionValuationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = riskcurve_core::value_option(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn implied_volatility(input_json: String) -> NapiResult<String> {
    let input: ImpliedVolInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = riskcurve_core::implied_volatility(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Regimes
// ---------------------------------------------------------------------------

#[napi]
pub fn regime_table() -> NapiResult<String> {
    serde_json::to_string(riskcurve_core::volatility::regime_table()).map_err(to_napi_error)
}
