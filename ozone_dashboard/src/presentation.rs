//! Display table, CSV export and the render view
//!
//! Everything here is a pure function of the model and the cached forecast,
//! so re-rendering never changes what the user sees or downloads.

use crate::chart::forecast_figure;
use crate::error::{DashboardError, Result};
use crate::session::SessionState;
use prophet_forecast::{ForecastResult, Horizon, ProphetModel};
use serde::Serialize;
use serde_json::Value;

/// Header of the date column
pub const DATE_COLUMN: &str = "Date (Day/Month/Year)";
/// Header of the estimate column
pub const VALUE_COLUMN: &str = "O3 (ug/m3)";
/// Date format used in the table and the export
pub const DATE_FORMAT: &str = "%d-%m-%Y";
/// Name of the downloadable export
pub const EXPORT_FILE_NAME: &str = "ozone_forecast.csv";
pub const EXPORT_MIME: &str = "text/csv";
/// Fixed viewport height of the table, in pixels
pub const TABLE_HEIGHT_PX: u32 = 300;
/// Shown until a prediction succeeds
pub const NO_FORECAST_PROMPT: &str = "Click 'Predict' to generate the forecast.";

/// Round to two decimals, halves to even, without a negative zero
fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round_ties_even() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// One formatted table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    /// 0-based position in the table
    pub index: usize,
    /// `DD-MM-YYYY`
    pub date: String,
    /// Estimate with exactly two decimals
    pub value: String,
}

/// The trailing `horizon` records, formatted for viewing and export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTable {
    pub headers: [&'static str; 2],
    pub rows: Vec<DisplayRow>,
}

impl DisplayTable {
    /// Project the future part of a forecast
    pub fn from_forecast(forecast: &ForecastResult) -> Self {
        let rows = forecast
            .future()
            .iter()
            .enumerate()
            .map(|(index, record)| DisplayRow {
                index,
                date: record.ds.format(DATE_FORMAT).to_string(),
                value: format!("{:.2}", round2(record.yhat)),
            })
            .collect();

        Self {
            headers: [DATE_COLUMN, VALUE_COLUMN],
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Comma-separated text: header row, then one line per row, no index
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(self.headers)?;
        for row in &self.rows {
            writer.write_record([row.date.as_str(), row.value.as_str()])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DashboardError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DashboardError::Export(e.to_string()))
    }
}

/// Everything the page shows for a valid forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub horizon: Horizon,
    pub table: DisplayTable,
    /// Plotly figure
    pub chart: Value,
    pub csv: String,
}

/// What to render for the current session
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// No forecast yet: a neutral prompt and nothing else
    Prompt(&'static str),
    Forecast(ForecastView),
}

/// Build the view for a session from its cached forecast
pub fn render(model: &ProphetModel, state: &SessionState) -> Result<View> {
    let Some(forecast) = state.valid_forecast() else {
        return Ok(View::Prompt(NO_FORECAST_PROMPT));
    };

    let table = DisplayTable::from_forecast(forecast);
    let csv = table.to_csv()?;
    Ok(View::Forecast(ForecastView {
        horizon: forecast.horizon(),
        chart: forecast_figure(model, forecast),
        table,
        csv,
    }))
}

/// Read the horizon field; anything below one day is raised to one
pub fn parse_horizon(text: &str) -> Result<Horizon> {
    text.trim()
        .parse::<i64>()
        .map(Horizon::clamped)
        .map_err(|_| DashboardError::InvalidHorizon(text.to_string()))
}
