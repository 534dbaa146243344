//! # Ozone Forecast
//!
//! Workspace facade for the ozone forecasting dashboard.
//!
//! - [`prophet_forecast`] loads the serialized Prophet model and predicts.
//! - [`ozone_dashboard`] keeps per-session state and renders the chart,
//!   table and CSV export over HTTP.
//!
//! ## Example
//!
//! ```no_run
//! use ozone_forecast_workspace::forecast_csv;
//!
//! let csv = forecast_csv("model_03_prophet.json", 3, 0)?;
//! assert_eq!(csv.lines().count(), 4);
//! # Ok::<(), ozone_forecast_workspace::ozone_dashboard::DashboardError>(())
//! ```

pub use ozone_dashboard;
pub use prophet_forecast;

use ozone_dashboard::{DashboardError, DisplayTable};
use prophet_forecast::{load_model, request_forecast, Horizon};
use std::path::Path;

/// Load the model at `path`, forecast `days` ahead and return the CSV export.
pub fn forecast_csv<P: AsRef<Path>>(
    path: P,
    days: i64,
    seed: u64,
) -> Result<String, DashboardError> {
    let model = load_model(path)?;
    let forecast = request_forecast(&model, Horizon::new(days)?, seed)?;
    DisplayTable::from_forecast(&forecast).to_csv()
}
