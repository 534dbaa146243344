//! Error types for the prophet_forecast crate

use thiserror::Error;

/// Custom error types for the prophet_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The model artifact is missing, corrupt or inconsistent
    #[error("Error loading the model: {0}")]
    LoadFailure(String),

    /// The forecasting computation could not run to completion
    #[error("Error generating the forecast: {0}")]
    PredictionFailure(String),

    /// The computation finished but produced no usable records
    #[error("The forecast failed or returned empty data.")]
    EmptyForecast,

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ForecastError {
    /// Whether the session can keep going after this error.
    ///
    /// Only a load failure is fatal: without a model nothing downstream works.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ForecastError::LoadFailure(_))
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
