//! Fitted Prophet model and point prediction

use crate::artifact::{
    decode_string_series, decode_table, decode_timestamp_series, number_cell, timestamp_cell,
    RawModel,
};
use crate::error::{ForecastError, Result};
use crate::forecast::{ForecastRecord, Horizon};
use crate::seasonality::{build_features, expected_width, HolidayWindow, Mode, Seasonality};
use crate::trend::{flat_trend, piecewise_linear};
use crate::uncertainty::predict_uncertainty;
use chrono::{Days, Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use serde_json::Value;

/// Last calendar day a forecast may reach (the nanosecond timestamp range)
pub const LAST_FORECAST_DAY: (i32, u32, u32) = (2262, 4, 11);

pub(crate) const LOGISTIC_NEEDS_CAP: &str =
    "logistic growth requires a 'cap' column, which the future dates do not carry";

/// Trend family the model was fitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    Linear,
    Flat,
    Logistic,
}

impl Growth {
    fn parse(text: &str) -> Result<Self> {
        match text {
            "linear" => Ok(Growth::Linear),
            "flat" => Ok(Growth::Flat),
            "logistic" => Ok(Growth::Logistic),
            other => Err(ForecastError::LoadFailure(format!("unknown growth '{}'", other))),
        }
    }
}

/// Fitted parameters, one row per posterior sample
#[derive(Debug, Clone)]
pub struct Params {
    /// Base growth rate
    pub k: Vec<f64>,
    /// Offset
    pub m: Vec<f64>,
    /// Observation noise
    pub sigma_obs: Vec<f64>,
    /// Rate adjustments at each changepoint
    pub delta: Vec<Vec<f64>>,
    /// Regressor coefficients
    pub beta: Vec<Vec<f64>>,
}

impl Params {
    /// Number of posterior samples (1 for a MAP fit)
    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn column_means(rows: &[Vec<f64>]) -> Vec<f64> {
    let width = rows.first().map_or(0, Vec::len);
    (0..width)
        .map(|j| rows.iter().map(|row| row[j]).sum::<f64>() / rows.len() as f64)
        .collect()
}

/// One training observation
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub ds: NaiveDateTime,
    pub y: Option<f64>,
}

/// A fitted Prophet model, ready to predict
#[derive(Debug, Clone)]
pub struct ProphetModel {
    growth: Growth,
    /// Epoch seconds of the first training date
    start: f64,
    /// Seconds spanned by the training data
    t_scale: f64,
    y_scale: f64,
    floor: f64,
    logistic_floor: bool,
    changepoints_t: Vec<f64>,
    history_dates: Vec<NaiveDateTime>,
    history: Vec<Observation>,
    seasonalities: Vec<Seasonality>,
    holidays: Vec<HolidayWindow>,
    holidays_mode: Mode,
    regressors: Vec<String>,
    interval_width: f64,
    uncertainty_samples: usize,
    params: Params,
}

fn required(field: &str, value: Option<f64>) -> Result<f64> {
    value.ok_or_else(|| {
        ForecastError::LoadFailure(format!("model has not been fit: '{}' is missing", field))
    })
}

fn epoch_seconds(ds: &NaiveDateTime) -> f64 {
    ds.and_utc().timestamp_millis() as f64 / 1000.0
}

impl ProphetModel {
    /// Reconstruct a model from the text of a serialized artifact
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawModel = serde_json::from_str(text)
            .map_err(|e| ForecastError::LoadFailure(format!("malformed model document: {}", e)))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawModel) -> Result<Self> {
        let growth = Growth::parse(&raw.growth)?;
        let start = required("start", raw.start)?;
        let t_scale = required("t_scale", raw.t_scale)?;
        let y_scale = required("y_scale", raw.y_scale)?;
        if !(t_scale > 0.0) {
            return Err(ForecastError::LoadFailure(format!(
                "t_scale must be positive, got {}",
                t_scale
            )));
        }

        let floor = match raw.scaling.as_str() {
            "absmax" => 0.0,
            "minmax" => raw.y_min.unwrap_or(0.0),
            other => {
                return Err(ForecastError::LoadFailure(format!("unknown scaling '{}'", other)));
            }
        };

        let history_text = raw.history.as_deref().ok_or_else(|| {
            ForecastError::LoadFailure("model has not been fit: no history".to_string())
        })?;
        let mut history = Vec::new();
        for row in decode_table("history", history_text)? {
            let ds = timestamp_cell("history", &row, "ds")?.ok_or_else(|| {
                ForecastError::LoadFailure("history row without a 'ds' value".to_string())
            })?;
            history.push(Observation {
                ds,
                y: number_cell(&row, "y"),
            });
        }

        let mut history_dates = match raw.history_dates.as_deref() {
            Some(text) => decode_timestamp_series("history_dates", text)?,
            None => history.iter().map(|o| o.ds).collect(),
        };
        history_dates.sort();
        history_dates.dedup();
        if history_dates.is_empty() {
            return Err(ForecastError::LoadFailure(
                "model history contains no dates".to_string(),
            ));
        }

        let (names, mut props) = raw.seasonalities;
        let mut seasonalities = Vec::with_capacity(names.len());
        for name in names {
            let p = props.remove(&name).ok_or_else(|| {
                ForecastError::LoadFailure(format!("seasonality '{}' has no properties", name))
            })?;
            if !(p.period > 0.0) {
                return Err(ForecastError::LoadFailure(format!(
                    "seasonality '{}' has a non-positive period",
                    name
                )));
            }
            seasonalities.push(Seasonality {
                mode: Mode::parse(&p.mode)?,
                period: p.period,
                fourier_order: p.fourier_order,
                condition_name: p.condition_name,
                name,
            });
        }

        if raw.country_holidays.is_some() {
            return Err(ForecastError::LoadFailure(
                "built-in country holiday calendars cannot be reproduced; \
                 supply holidays explicitly"
                    .to_string(),
            ));
        }
        let holidays =
            Self::holiday_windows(raw.holidays.as_deref(), raw.train_holiday_names.as_deref())?;
        let holidays_mode = match &raw.component_modes {
            Some(modes) if modes.multiplicative.iter().any(|c| c == "holidays") => {
                Mode::Multiplicative
            }
            _ => Mode::Additive,
        };

        let regressors = raw.extra_regressors.map(|(names, _)| names).unwrap_or_default();
        let changepoints_t = raw.changepoints_t.unwrap_or_default();

        let param = |name: &str| {
            raw.params.get(name).ok_or_else(|| {
                ForecastError::LoadFailure(format!("parameter '{}' is missing", name))
            })
        };
        let params = Params {
            k: param("k")?.scalar_rows("k")?,
            m: param("m")?.scalar_rows("m")?,
            sigma_obs: param("sigma_obs")?.scalar_rows("sigma_obs")?,
            delta: param("delta")?.vector_rows(),
            beta: param("beta")?.vector_rows(),
        };

        let model = Self {
            growth,
            start,
            t_scale,
            y_scale,
            floor,
            logistic_floor: raw.logistic_floor,
            changepoints_t,
            history_dates,
            history,
            seasonalities,
            holidays,
            holidays_mode,
            regressors,
            interval_width: raw.interval_width,
            uncertainty_samples: raw.uncertainty_samples as usize,
            params,
        };
        model.validate_params()?;
        Ok(model)
    }

    /// Holiday windows restricted to the names seen in training
    fn holiday_windows(
        holidays: Option<&str>,
        train_names: Option<&str>,
    ) -> Result<Vec<HolidayWindow>> {
        let mut windows = Vec::new();
        if let Some(text) = holidays {
            for row in decode_table("holidays", text)? {
                let name = match row.get("holiday") {
                    Some(Value::String(s)) => s.clone(),
                    _ => {
                        return Err(ForecastError::LoadFailure(
                            "holiday row without a name".to_string(),
                        ))
                    }
                };
                windows.push(HolidayWindow {
                    name,
                    date: timestamp_cell("holidays", &row, "ds")?.map(|ts| ts.date()),
                    lower_window: number_cell(&row, "lower_window").map_or(0, |v| v as i64),
                    upper_window: number_cell(&row, "upper_window").map_or(0, |v| v as i64),
                });
            }
        }

        if let Some(text) = train_names {
            let names = decode_string_series("train_holiday_names", text)?;
            windows.retain(|w| names.contains(&w.name));
            for name in names {
                if !windows.iter().any(|w| w.name == name) {
                    windows.push(HolidayWindow {
                        name,
                        date: None,
                        lower_window: 0,
                        upper_window: 0,
                    });
                }
            }
        }

        Ok(windows)
    }

    fn validate_params(&self) -> Result<()> {
        let p = &self.params;
        let n = p.len();
        if n == 0 {
            return Err(ForecastError::LoadFailure("parameters hold no samples".to_string()));
        }
        if p.m.len() != n || p.sigma_obs.len() != n || p.delta.len() != n || p.beta.len() != n {
            return Err(ForecastError::LoadFailure(
                "parameters disagree on the number of samples".to_string(),
            ));
        }
        if let Some(row) = p.delta.iter().find(|row| row.len() != self.changepoints_t.len()) {
            return Err(ForecastError::LoadFailure(format!(
                "delta has {} entries but there are {} changepoints",
                row.len(),
                self.changepoints_t.len()
            )));
        }
        let width = expected_width(&self.seasonalities, &self.holidays, self.regressors.len());
        if let Some(row) = p.beta.iter().find(|row| row.len() != width) {
            return Err(ForecastError::LoadFailure(format!(
                "beta has {} entries but the model defines {} regressor columns",
                row.len(),
                width
            )));
        }
        Ok(())
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn changepoints_t(&self) -> &[f64] {
        &self.changepoints_t
    }

    pub fn y_scale(&self) -> f64 {
        self.y_scale
    }

    /// Width of the uncertainty interval, e.g. 0.8
    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }

    /// Number of simulated paths behind the bounds; 0 disables them
    pub fn uncertainty_samples(&self) -> usize {
        self.uncertainty_samples
    }

    pub fn seasonalities(&self) -> &[Seasonality] {
        &self.seasonalities
    }

    /// Observations the model was fitted on
    pub fn history(&self) -> &[Observation] {
        &self.history
    }

    pub fn history_dates(&self) -> &[NaiveDateTime] {
        &self.history_dates
    }

    /// Last date of the training data
    pub fn last_training_date(&self) -> NaiveDateTime {
        // history_dates is sorted and non-empty after loading
        self.history_dates[self.history_dates.len() - 1]
    }

    /// History dates followed by `horizon` consecutive days after the last one
    ///
    /// Fails with `PredictionFailure` when the last day would fall past
    /// [`LAST_FORECAST_DAY`]; nothing is allocated in that case.
    pub fn make_future_dates(&self, horizon: Horizon) -> Result<Vec<NaiveDateTime>> {
        let last = self.last_training_date();
        let (y, m, d) = LAST_FORECAST_DAY;
        let limit = NaiveDate::from_ymd_opt(y, m, d);
        let end = last.checked_add_days(Days::new(horizon.days() as u64));

        match (end, limit) {
            (Some(end), Some(limit)) if end.date() <= limit => {}
            _ => {
                return Err(ForecastError::PredictionFailure(format!(
                    "a horizon of {} days runs past the last representable date {:04}-{:02}-{:02}",
                    horizon, y, m, d
                )))
            }
        }

        let mut dates = Vec::with_capacity(self.history_dates.len() + horizon.days());
        dates.extend_from_slice(&self.history_dates);
        let mut day = last;
        for _ in 0..horizon.days() {
            day += Duration::days(1);
            dates.push(day);
        }
        Ok(dates)
    }

    /// Point estimates and bounds for each of `dates`
    pub fn predict(
        &self,
        dates: &[NaiveDateTime],
        rng: &mut StdRng,
    ) -> Result<Vec<ForecastRecord>> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }
        if self.growth == Growth::Logistic {
            return Err(ForecastError::PredictionFailure(LOGISTIC_NEEDS_CAP.to_string()));
        }
        if self.logistic_floor {
            return Err(ForecastError::PredictionFailure(
                "model expects a 'floor' column, which the future dates do not carry".to_string(),
            ));
        }

        let t: Vec<f64> = dates
            .iter()
            .map(|ds| (epoch_seconds(ds) - self.start) / self.t_scale)
            .collect();
        let features = build_features(
            dates,
            &self.seasonalities,
            &self.holidays,
            self.holidays_mode,
            &self.regressors,
        )?;

        let k = mean(&self.params.k);
        let m = mean(&self.params.m);
        let deltas = column_means(&self.params.delta);
        let trend: Vec<f64> = match self.growth {
            Growth::Flat => flat_trend(&t, m),
            _ => piecewise_linear(&t, &deltas, k, m, &self.changepoints_t),
        }
        .into_iter()
        .map(|v| v * self.y_scale + self.floor)
        .collect();

        let beta = column_means(&self.params.beta);
        let additive = features.dot(&beta, &features.mode_mask(Mode::Additive));
        let multiplicative = features.dot(&beta, &features.mode_mask(Mode::Multiplicative));
        let yhat: Vec<f64> = trend
            .iter()
            .zip(additive.iter().zip(&multiplicative))
            .map(|(tr, (a, mu))| tr * (1.0 + mu) + a * self.y_scale)
            .collect();

        if let Some(pos) = yhat.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::PredictionFailure(format!(
                "non-finite estimate for {}",
                dates[pos]
            )));
        }

        let (lower, upper) = if self.uncertainty_samples > 0 {
            let bounds = predict_uncertainty(self, &t, &features, self.floor, rng)?;
            (bounds.lower, bounds.upper)
        } else {
            (yhat.clone(), yhat.clone())
        };

        Ok(dates
            .iter()
            .enumerate()
            .map(|(i, ds)| ForecastRecord {
                ds: *ds,
                yhat: yhat[i],
                yhat_lower: lower[i],
                yhat_upper: upper[i],
                trend: trend[i],
            })
            .collect())
    }
}
