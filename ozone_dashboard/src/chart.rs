//! Plotly figure for a forecast
//!
//! The payload is rendered by plotly.js in the browser: observed history as
//! black markers, the point estimate as a line, and the uncertainty interval
//! as a shaded band.

use prophet_forecast::{ForecastResult, ProphetModel};
use serde_json::{json, Value};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FORECAST_COLOR: &str = "#0072B2";
const BAND_COLOR: &str = "rgba(0, 114, 178, 0.2)";
const WHITE: &str = "rgba(255, 255, 255, 1)";

/// Light theme with black title and axis text
fn themed_layout() -> Value {
    let black = json!({ "color": "black" });
    json!({
        "plot_bgcolor": WHITE,
        "paper_bgcolor": WHITE,
        "title": { "text": "Ozone Forecast", "font": black },
        "xaxis": {
            "title": { "text": "Date", "font": black },
            "tickfont": black,
            "type": "date",
            "rangeslider": { "visible": true },
        },
        "yaxis": {
            "title": { "text": "Ozone Level (O3 μg/m3)", "font": black },
            "tickfont": black,
        },
        "showlegend": false,
        "height": 600,
    })
}

/// Full history plus forecast, with observations overlaid
pub fn forecast_figure(model: &ProphetModel, forecast: &ForecastResult) -> Value {
    let records = forecast.records();
    let dates: Vec<String> = records
        .iter()
        .map(|r| r.ds.format(DATE_TIME_FORMAT).to_string())
        .collect();
    let yhat: Vec<f64> = records.iter().map(|r| r.yhat).collect();
    let lower: Vec<f64> = records.iter().map(|r| r.yhat_lower).collect();
    let upper: Vec<f64> = records.iter().map(|r| r.yhat_upper).collect();

    let observed: Vec<&prophet_forecast::Observation> =
        model.history().iter().filter(|o| o.y.is_some()).collect();
    let observed_dates: Vec<String> = observed
        .iter()
        .map(|o| o.ds.format(DATE_TIME_FORMAT).to_string())
        .collect();
    let observed_values: Vec<Option<f64>> = observed.iter().map(|o| o.y).collect();

    let data = json!([
        {
            "name": "Actual",
            "type": "scatter",
            "x": observed_dates,
            "y": observed_values,
            "mode": "markers",
            "marker": { "color": "black", "size": 4 },
        },
        {
            "name": "Lower Bound",
            "type": "scatter",
            "x": dates,
            "y": lower,
            "mode": "lines",
            "line": { "width": 0 },
            "hoverinfo": "skip",
        },
        {
            "name": "Predicted",
            "type": "scatter",
            "x": dates,
            "y": yhat,
            "mode": "lines",
            "line": { "color": FORECAST_COLOR, "width": 2 },
            "fillcolor": BAND_COLOR,
            "fill": "tonexty",
        },
        {
            "name": "Upper Bound",
            "type": "scatter",
            "x": dates,
            "y": upper,
            "mode": "lines",
            "line": { "width": 0 },
            "fillcolor": BAND_COLOR,
            "fill": "tonexty",
            "hoverinfo": "skip",
        },
    ]);

    json!({ "data": data, "layout": themed_layout() })
}
