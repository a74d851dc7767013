use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unsolvable cash flow: {0}")]
    UnsolvableCashFlow(String),

    #[error("Convergence failure: {method} did not converge after {iterations} iterations (residual NPV: {residual})")]
    ConvergenceFailure {
        method: String,
        iterations: u32,
        residual: Decimal,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::SerializationError(e.to_string())
    }
}
