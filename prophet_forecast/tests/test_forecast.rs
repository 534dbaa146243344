use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use prophet_forecast::{request_forecast, ForecastError, Horizon, ProphetModel};
use rstest::rstest;
use serde_json::{json, Value};
use std::f64::consts::PI;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ozone_model.json");

fn fixture_value() -> Value {
    let text = std::fs::read_to_string(FIXTURE).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn model_from(value: &Value) -> ProphetModel {
    ProphetModel::from_json_str(&value.to_string()).unwrap()
}

fn fixture_model() -> ProphetModel {
    model_from(&fixture_value())
}

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

/// Point estimate of the fixture model computed by hand
fn expected_yhat(ds: NaiveDateTime) -> f64 {
    let start = day(2023, 5, 1);
    let t = (ds - start).num_seconds() as f64 / 345_600.0;
    let (k, m, delta, cp) = (0.1, 0.8, 0.05, 0.5);
    let trend = if t >= cp {
        (k + delta) * t + (m - cp * delta)
    } else {
        k * t + m
    };

    let days = ds.and_utc().timestamp() as f64 / 86_400.0;
    let x = 2.0 * PI * days / 7.0;
    let weekly = 0.02 * x.sin() - 0.01 * x.cos();

    (trend + weekly) * 50.0
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(30)]
fn test_forecast_covers_history_and_horizon(#[case] days: i64) {
    let model = fixture_model();
    let horizon = Horizon::new(days).unwrap();
    let forecast = request_forecast(&model, horizon, 0).unwrap();

    assert_eq!(forecast.len(), 5 + days as usize);
    assert_eq!(forecast.future().len(), days as usize);
    assert_eq!(forecast.horizon(), horizon);
    assert_eq!(forecast.future()[0].ds, day(2023, 5, 6));
}

#[test]
fn test_future_dates_follow_training_end() {
    let model = fixture_model();
    let forecast = request_forecast(&model, Horizon::new(3).unwrap(), 0).unwrap();

    let dates: Vec<String> = forecast
        .future()
        .iter()
        .map(|r| r.ds.format("%d-%m-%Y").to_string())
        .collect();
    assert_eq!(dates, vec!["06-05-2023", "07-05-2023", "08-05-2023"]);
}

#[test]
fn test_point_estimates_match_components() {
    let model = fixture_model();
    let forecast = request_forecast(&model, Horizon::new(10).unwrap(), 0).unwrap();

    for record in forecast.records() {
        let expected = expected_yhat(record.ds);
        assert!(
            (record.yhat - expected).abs() < 1e-9,
            "{}: {} != {}",
            record.ds,
            record.yhat,
            expected
        );
    }
}

#[test]
fn test_same_seed_same_result() {
    let model = fixture_model();
    let horizon = Horizon::new(14).unwrap();

    let first = request_forecast(&model, horizon, 7).unwrap();
    let second = request_forecast(&model, horizon, 7).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_bounds_bracket_history() {
    let model = fixture_model();
    let forecast = request_forecast(&model, Horizon::new(20).unwrap(), 0).unwrap();

    for record in forecast.records() {
        assert!(record.yhat_lower <= record.yhat_upper);
    }
    // Within the training range only observation noise is simulated
    for record in &forecast.records()[..5] {
        assert!(record.yhat_lower < record.yhat && record.yhat < record.yhat_upper);
    }
}

#[test]
fn test_no_uncertainty_samples() {
    let mut value = fixture_value();
    value["uncertainty_samples"] = json!(0);
    let model = model_from(&value);

    let forecast = request_forecast(&model, Horizon::new(4).unwrap(), 0).unwrap();
    for record in forecast.records() {
        assert_eq!(record.yhat_lower, record.yhat);
        assert_eq!(record.yhat_upper, record.yhat);
    }
}

#[test]
fn test_flat_growth() {
    let mut value = fixture_value();
    value["growth"] = json!("flat");
    value["params"]["beta"] = json!([[0.0, 0.0]]);
    let model = model_from(&value);

    let forecast = request_forecast(&model, Horizon::new(5).unwrap(), 0).unwrap();
    for record in forecast.records() {
        assert!((record.yhat - 40.0).abs() < 1e-9);
        assert!((record.trend - 40.0).abs() < 1e-9);
    }
}

#[test]
fn test_multiplicative_holiday() {
    let mut value = fixture_value();
    let holidays = json!({
        "schema": {"fields": [
            {"name": "ds", "type": "datetime"},
            {"name": "holiday", "type": "string"}
        ]},
        "data": [{
            "ds": "2023-05-07T00:00:00.000",
            "holiday": "ozone_day",
            "lower_window": 0,
            "upper_window": 1
        }]
    });
    let names = json!({"name": "holiday", "index": [0], "data": ["ozone_day"]});
    value["holidays"] = json!(holidays.to_string());
    value["train_holiday_names"] = json!(names.to_string());
    value["component_modes"]["multiplicative"] =
        json!(["holidays", "ozone_day", "multiplicative_terms"]);
    value["params"]["beta"] = json!([[0.02, -0.01, 0.5, 0.25]]);
    value["uncertainty_samples"] = json!(0);
    let model = model_from(&value);

    let forecast = request_forecast(&model, Horizon::new(4).unwrap(), 0).unwrap();
    let future = forecast.future();

    // 06-05 untouched, 07-05 is "+0", 08-05 is "+1"
    let trend_of = |i: usize| future[i].trend;
    assert!((future[0].yhat - expected_yhat(future[0].ds)).abs() < 1e-9);

    let plain_day2 = expected_yhat(future[1].ds);
    let weekly_day2 = plain_day2 - trend_of(1);
    assert!((future[1].yhat - (trend_of(1) * 1.5 + weekly_day2)).abs() < 1e-9);

    let plain_day3 = expected_yhat(future[2].ds);
    let weekly_day3 = plain_day3 - trend_of(2);
    assert!((future[2].yhat - (trend_of(2) * 1.25 + weekly_day3)).abs() < 1e-9);

    assert!((future[3].yhat - expected_yhat(future[3].ds)).abs() < 1e-9);
}

#[test]
fn test_logistic_growth_fails_to_predict() {
    let mut value = fixture_value();
    value["growth"] = json!("logistic");
    let model = model_from(&value);

    let result = request_forecast(&model, Horizon::default(), 0);
    assert!(matches!(result, Err(ForecastError::PredictionFailure(_))));
}

#[test]
fn test_conditional_seasonality_fails_to_predict() {
    let mut value = fixture_value();
    value["seasonalities"][1]["weekly"]["condition_name"] = json!("is_summer");
    let model = model_from(&value);

    let result = request_forecast(&model, Horizon::default(), 0);
    assert!(matches!(result, Err(ForecastError::PredictionFailure(_))));
}

#[rstest]
#[case(87_270)]
#[case(100_000_000)]
#[case(1_000_000_000_000)]
#[case(i64::MAX)]
fn test_horizon_past_last_date_is_recoverable(#[case] days: i64) {
    let model = fixture_model();
    let result = request_forecast(&model, Horizon::new(days).unwrap(), 0);

    match result {
        Err(err @ ForecastError::PredictionFailure(_)) => assert!(err.is_recoverable()),
        other => panic!("expected a prediction failure, got {:?}", other.map(|f| f.len())),
    }
}

#[test]
fn test_horizon_up_to_last_date() {
    let mut value = fixture_value();
    value["uncertainty_samples"] = json!(0);
    let model = model_from(&value);

    let forecast = request_forecast(&model, Horizon::new(87_269).unwrap(), 0).unwrap();
    let last = forecast.future().last().unwrap();
    assert_eq!(last.ds, day(2262, 4, 11));
}
