//! # Prophet Forecast
//!
//! Load a Prophet model serialized with `model_to_json` and generate daily
//! forecasts from it, without a Python runtime.
//!
//! ## Features
//!
//! - Artifact loading with strict validation of the fitted parameters
//! - Linear and flat trends with changepoints
//! - Fourier seasonalities and holiday windows, additive or multiplicative
//! - Simulation-based uncertainty intervals with a seeded RNG
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prophet_forecast::{load_model, request_forecast, Horizon};
//!
//! let model = load_model("model_03_prophet.json")?;
//! let forecast = request_forecast(&model, Horizon::new(3)?, 0)?;
//!
//! for record in forecast.future() {
//!     println!("{} {:.2}", record.ds.format("%d-%m-%Y"), record.yhat);
//! }
//! # Ok::<(), prophet_forecast::ForecastError>(())
//! ```

mod artifact;
pub mod error;
pub mod forecast;
pub mod loader;
pub mod model;
pub mod seasonality;
pub mod trend;
pub mod uncertainty;

// Re-export commonly used types
pub use crate::artifact::parse_timestamp;
pub use crate::error::{ForecastError, Result};
pub use crate::forecast::{request_forecast, ForecastRecord, ForecastResult, Horizon};
pub use crate::loader::{load_model, DEFAULT_MODEL_PATH};
pub use crate::model::{Growth, Observation, ProphetModel};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
