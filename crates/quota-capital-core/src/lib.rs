pub mod allocation;
pub mod cashflow;
pub mod collateral;
pub mod deal;
pub mod engine;
pub mod error;
pub mod rate;
pub mod schedule;
pub mod types;

pub use error::EngineError;
pub use types::*;

/// Standard result type for fallible engine entry points. Business-logic
/// conditions (insufficient collateral, non-converged rates) never travel
/// through this type; they are tagged fields on the result records.
pub type EngineResult<T> = Result<T, EngineError>;
