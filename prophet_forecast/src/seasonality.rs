//! Seasonal and holiday regressors for a set of dates

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

/// How a component combines with the trend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Additive,
    Multiplicative,
}

impl Mode {
    pub(crate) fn parse(text: &str) -> Result<Self> {
        match text {
            "additive" => Ok(Mode::Additive),
            "multiplicative" => Ok(Mode::Multiplicative),
            other => Err(ForecastError::LoadFailure(format!(
                "unknown component mode '{}'",
                other
            ))),
        }
    }
}

/// A Fourier seasonality fitted by the model
#[derive(Debug, Clone, PartialEq)]
pub struct Seasonality {
    pub name: String,
    /// Period in days
    pub period: f64,
    pub fourier_order: usize,
    pub mode: Mode,
    /// Boolean column gating this seasonality, if any
    pub condition_name: Option<String>,
}

/// One holiday occurrence and the window of days around it
#[derive(Debug, Clone, PartialEq)]
pub struct HolidayWindow {
    pub name: String,
    /// `None` for holidays seen in training but absent from the calendar
    pub date: Option<NaiveDate>,
    pub lower_window: i64,
    pub upper_window: i64,
}

impl HolidayWindow {
    /// Column names this window produces, e.g. `Easter_delim_-1`, `Easter_delim_+0`
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        (self.lower_window..=self.upper_window).map(move |offset| holiday_key(&self.name, offset))
    }
}

fn holiday_key(name: &str, offset: i64) -> String {
    format!(
        "{}_delim_{}{}",
        name,
        if offset >= 0 { '+' } else { '-' },
        offset.abs()
    )
}

/// Metadata of one regressor column
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    pub name: String,
    /// Component the column contributes to (`yearly`, a holiday name, ...)
    pub component: String,
    pub mode: Mode,
}

/// Column-major regressor matrix aligned with the model's `beta`
#[derive(Debug, Clone)]
pub struct SeasonalFeatures {
    columns: Vec<FeatureColumn>,
    values: Vec<Vec<f64>>,
    rows: usize,
}

impl SeasonalFeatures {
    /// Column metadata in `beta` order
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Number of regressor columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of dates
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 1.0 for columns of the given mode, 0.0 otherwise
    pub fn mode_mask(&self, mode: Mode) -> Vec<f64> {
        self.columns
            .iter()
            .map(|c| if c.mode == mode { 1.0 } else { 0.0 })
            .collect()
    }

    /// Row-wise `X · (beta ⊙ mask)`
    pub fn dot(&self, beta: &[f64], mask: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.rows];
        for ((column, &b), &w) in self.values.iter().zip(beta).zip(mask) {
            let coef = b * w;
            if coef == 0.0 {
                continue;
            }
            for (acc, &x) in out.iter_mut().zip(column) {
                *acc += x * coef;
            }
        }
        out
    }
}

/// Days since the Unix epoch, fractional
fn days_since_epoch(ds: &NaiveDateTime) -> f64 {
    ds.and_utc().timestamp_millis() as f64 / 1000.0 / 86_400.0
}

/// Fourier terms `sin, cos` of orders `1..=order`, returned column-major
pub fn fourier_series(dates: &[NaiveDateTime], period: f64, order: usize) -> Vec<Vec<f64>> {
    let t: Vec<f64> = dates.iter().map(days_since_epoch).collect();
    let mut columns = Vec::with_capacity(2 * order);
    for i in 0..order {
        let freq = 2.0 * (i + 1) as f64 * PI / period;
        columns.push(t.iter().map(|&x| (freq * x).sin()).collect());
        columns.push(t.iter().map(|&x| (freq * x).cos()).collect());
    }
    columns
}

/// Holiday indicator columns, sorted by key
pub fn holiday_features(
    dates: &[NaiveDateTime],
    windows: &[HolidayWindow],
) -> BTreeMap<String, (String, Vec<f64>)> {
    let index: HashMap<NaiveDateTime, usize> =
        dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let mut features: BTreeMap<String, (String, Vec<f64>)> = BTreeMap::new();

    for window in windows {
        for offset in window.lower_window..=window.upper_window {
            let key = holiday_key(&window.name, offset);
            let entry = features
                .entry(key)
                .or_insert_with(|| (window.name.clone(), vec![0.0; dates.len()]));

            let occurrence = window
                .date
                .and_then(|d| d.checked_add_signed(Duration::days(offset)))
                .and_then(|d| d.and_hms_opt(0, 0, 0));
            if let Some(loc) = occurrence.and_then(|o| index.get(&o)) {
                entry.1[*loc] = 1.0;
            }
        }
    }

    features
}

/// Number of regressor columns a model with these components was fitted with
pub fn expected_width(
    seasonalities: &[Seasonality],
    holidays: &[HolidayWindow],
    regressors: usize,
) -> usize {
    let mut keys: Vec<String> = holidays.iter().flat_map(|h| h.keys()).collect();
    keys.sort();
    keys.dedup();

    let fourier: usize = seasonalities.iter().map(|s| 2 * s.fourier_order).sum();
    let width = fourier + keys.len() + regressors;
    width.max(1)
}

/// Build the regressor matrix for `dates`
///
/// Column order is seasonalities in model order, then holiday windows sorted
/// by key, matching the layout the model was fitted with.
pub fn build_features(
    dates: &[NaiveDateTime],
    seasonalities: &[Seasonality],
    holidays: &[HolidayWindow],
    holidays_mode: Mode,
    regressors: &[String],
) -> Result<SeasonalFeatures> {
    let mut columns = Vec::new();
    let mut values = Vec::new();

    for seasonality in seasonalities {
        if let Some(condition) = &seasonality.condition_name {
            return Err(ForecastError::PredictionFailure(format!(
                "seasonality '{}' is conditioned on column '{}', \
                 which the future dates do not carry",
                seasonality.name, condition
            )));
        }

        let terms = fourier_series(dates, seasonality.period, seasonality.fourier_order);
        for (i, column) in terms.into_iter().enumerate() {
            columns.push(FeatureColumn {
                name: format!("{}_delim_{}", seasonality.name, i + 1),
                component: seasonality.name.clone(),
                mode: seasonality.mode,
            });
            values.push(column);
        }
    }

    for (key, (holiday, column)) in holiday_features(dates, holidays) {
        columns.push(FeatureColumn {
            name: key,
            component: holiday,
            mode: holidays_mode,
        });
        values.push(column);
    }

    if let Some(name) = regressors.first() {
        return Err(ForecastError::PredictionFailure(format!(
            "regressor '{}' missing from the future dates",
            name
        )));
    }

    // Placeholder so the matrix is never empty
    if columns.is_empty() {
        columns.push(FeatureColumn {
            name: "zeros".to_string(),
            component: "zeros".to_string(),
            mode: Mode::Additive,
        });
        values.push(vec![0.0; dates.len()]);
    }

    Ok(SeasonalFeatures {
        columns,
        values,
        rows: dates.len(),
    })
}
