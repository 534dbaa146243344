//! Forecast requests and their results

use crate::error::{ForecastError, Result};
use crate::model::ProphetModel;
use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;

/// Number of future days to forecast, always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Horizon(usize);

impl Horizon {
    /// Validate a user-supplied day count
    pub fn new(days: i64) -> Result<Self> {
        if days < 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "horizon must be at least 1 day, got {}",
                days
            )));
        }
        Ok(Self(days as usize))
    }

    /// Like `new`, but raises anything below one day to one
    pub fn clamped(days: i64) -> Self {
        Self(days.max(1) as usize)
    }

    pub fn days(&self) -> usize {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prediction for one date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRecord {
    pub ds: NaiveDateTime,
    /// Point estimate
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub trend: f64,
}

/// Historical fit plus future prediction from one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    records: Vec<ForecastRecord>,
    horizon: Horizon,
}

impl ForecastResult {
    /// Wrap prediction records, rejecting results that cannot cover the horizon
    pub fn new(records: Vec<ForecastRecord>, horizon: Horizon) -> Result<Self> {
        if records.is_empty() {
            return Err(ForecastError::EmptyForecast);
        }
        if records.len() < horizon.days() {
            return Err(ForecastError::PredictionFailure(format!(
                "expected at least {} records, got {}",
                horizon,
                records.len()
            )));
        }
        Ok(Self { records, horizon })
    }

    /// All records, history first
    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    /// Horizon this result was requested for
    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// The trailing `horizon` records
    pub fn future(&self) -> &[ForecastRecord] {
        &self.records[self.records.len() - self.horizon.days()..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Predict history plus `horizon` days past the end of training
///
/// `seed` drives the uncertainty simulation, so repeated calls with the same
/// model, horizon and seed return identical results.
pub fn request_forecast(
    model: &ProphetModel,
    horizon: Horizon,
    seed: u64,
) -> Result<ForecastResult> {
    let dates = model.make_future_dates(horizon)?;
    let mut rng = StdRng::seed_from_u64(seed);

    tracing::debug!(horizon = horizon.days(), dates = dates.len(), "running prediction");
    let records = model.predict(&dates, &mut rng)?;

    ForecastResult::new(records, horizon)
}
