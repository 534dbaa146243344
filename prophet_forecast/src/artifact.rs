//! Raw layout of a Prophet model serialized with `model_to_json`
//!
//! The document is a JSON object whose pandas-backed attributes are themselves
//! JSON strings (`Series.to_json(orient="split")` and
//! `DataFrame.to_json(orient="table")`), so they are decoded in a second pass.

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Top-level artifact as written by the forecasting library
#[derive(Debug, Deserialize)]
pub(crate) struct RawModel {
    pub growth: String,
    pub start: Option<f64>,
    pub t_scale: Option<f64>,
    pub y_scale: Option<f64>,
    #[serde(default)]
    pub y_min: Option<f64>,
    #[serde(default = "default_scaling")]
    pub scaling: String,
    #[serde(default)]
    pub logistic_floor: bool,
    #[serde(default)]
    pub changepoints_t: Option<Vec<f64>>,
    pub history_dates: Option<String>,
    pub history: Option<String>,
    pub seasonalities: (Vec<String>, HashMap<String, RawSeasonality>),
    #[serde(default)]
    pub extra_regressors: Option<(Vec<String>, HashMap<String, Value>)>,
    #[serde(default)]
    pub holidays: Option<String>,
    #[serde(default)]
    pub train_holiday_names: Option<String>,
    #[serde(default)]
    pub country_holidays: Option<String>,
    #[serde(default)]
    pub component_modes: Option<RawComponentModes>,
    pub interval_width: f64,
    #[serde(default)]
    pub uncertainty_samples: u64,
    pub params: HashMap<String, RawParam>,
}

fn default_scaling() -> String {
    "absmax".to_string()
}

/// Properties of one seasonal component
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSeasonality {
    pub period: f64,
    pub fourier_order: usize,
    pub mode: String,
    #[serde(default)]
    pub condition_name: Option<String>,
}

/// Named components fitted as multiplicative
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawComponentModes {
    #[serde(default)]
    pub multiplicative: Vec<String>,
}

/// A fitted parameter: one entry (scalar or vector) per posterior sample
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawParam {
    Scalar(f64),
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

impl RawParam {
    /// Interpret as one scalar per sample
    pub fn scalar_rows(&self, name: &str) -> Result<Vec<f64>> {
        match self {
            RawParam::Scalar(v) => Ok(vec![*v]),
            RawParam::Flat(values) => Ok(values.clone()),
            RawParam::Nested(rows) => rows
                .iter()
                .map(|row| match row.as_slice() {
                    [v] => Ok(*v),
                    _ => Err(ForecastError::LoadFailure(format!(
                        "parameter '{}' must hold one value per sample, found a row of {}",
                        name,
                        row.len()
                    ))),
                })
                .collect(),
        }
    }

    /// Interpret as one vector per sample
    pub fn vector_rows(&self) -> Vec<Vec<f64>> {
        match self {
            RawParam::Scalar(v) => vec![vec![*v]],
            RawParam::Flat(values) => vec![values.clone()],
            RawParam::Nested(rows) => rows.clone(),
        }
    }
}

/// `Series.to_json(orient="split")`
#[derive(Debug, Deserialize)]
struct SplitSeries<T> {
    data: Vec<T>,
}

/// `DataFrame.to_json(orient="table")`
#[derive(Debug, Deserialize)]
struct TableFrame {
    data: Vec<Map<String, Value>>,
}

fn decode_embedded<T: DeserializeOwned>(field: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        ForecastError::LoadFailure(format!("attribute '{}' is not valid pandas JSON: {}", field, e))
    })
}

/// Decode a split-oriented series of timestamps
pub(crate) fn decode_timestamp_series(field: &str, text: &str) -> Result<Vec<NaiveDateTime>> {
    let series: SplitSeries<String> = decode_embedded(field, text)?;
    series
        .data
        .iter()
        .map(|s| parse_timestamp(s).ok_or_else(|| bad_timestamp(field, s)))
        .collect()
}

/// Decode a split-oriented series of strings, skipping nulls
pub(crate) fn decode_string_series(field: &str, text: &str) -> Result<Vec<String>> {
    let series: SplitSeries<Option<String>> = decode_embedded(field, text)?;
    Ok(series.data.into_iter().flatten().collect())
}

/// Decode a table-oriented frame into its rows
pub(crate) fn decode_table(field: &str, text: &str) -> Result<Vec<Map<String, Value>>> {
    let frame: TableFrame = decode_embedded(field, text)?;
    Ok(frame.data)
}

/// Read a timestamp cell out of a table row
pub(crate) fn timestamp_cell(
    field: &str,
    row: &Map<String, Value>,
    column: &str,
) -> Result<Option<NaiveDateTime>> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| bad_timestamp(field, s)),
        Some(other) => Err(ForecastError::LoadFailure(format!(
            "attribute '{}' has a non-timestamp '{}' value: {}",
            field, column, other
        ))),
    }
}

/// Read a numeric cell out of a table row; nulls and absent cells are `None`
pub(crate) fn number_cell(row: &Map<String, Value>, column: &str) -> Option<f64> {
    row.get(column).and_then(Value::as_f64)
}

fn bad_timestamp(field: &str, value: &str) -> ForecastError {
    ForecastError::LoadFailure(format!(
        "attribute '{}' holds an unreadable timestamp '{}'",
        field, value
    ))
}

/// Parse the ISO timestamps pandas writes, with or without `Z` and fractions
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim().trim_end_matches('Z');
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
