//! Error types for the ozone_dashboard crate

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prophet_forecast::ForecastError;
use thiserror::Error;

/// Errors surfaced by the dashboard
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Loading or running the model failed
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// The horizon field did not hold a whole number
    #[error("Invalid number of days: '{0}'")]
    InvalidHorizon(String),

    /// Serializing the table failed
    #[error("Export error: {0}")]
    Export(String),

    /// Invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The page template failed to compile or render
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, DashboardError>;

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
