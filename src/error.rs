//! Forecasting error taxonomy
//!
//! None of these are retried: every computation is deterministic, so a retry
//! would reproduce the same failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// No predictive model is bound to the engine
    #[error("Model not loaded")]
    ModelUnavailable,

    /// Malformed request input; `field` names the offending input
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// The model call failed or produced an unusable value
    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl ForecastError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn computation(error: impl std::fmt::Display) -> Self {
        Self::ComputationError(error.to_string())
    }
}

pub type Result<T, E = ForecastError> = std::result::Result<T, E>;
