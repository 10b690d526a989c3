use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskCurveError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: f64,
    },

    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RiskCurveError {
    fn from(e: serde_json::Error) -> Self {
        RiskCurveError::SerializationError(e.to_string())
    }
}
