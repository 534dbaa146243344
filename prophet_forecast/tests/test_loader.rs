use prophet_forecast::{load_model, ForecastError, Growth, ProphetModel};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ozone_model.json");

fn fixture_value() -> Value {
    let text = std::fs::read_to_string(FIXTURE).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn write_model(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", value).unwrap();
    file
}

fn assert_load_failure(result: Result<ProphetModel, ForecastError>) {
    match result {
        Err(ForecastError::LoadFailure(_)) => {}
        other => panic!("Expected LoadFailure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_load_fixture() {
    let model = load_model(FIXTURE).unwrap();

    assert_eq!(model.growth(), Growth::Linear);
    assert_eq!(model.history().len(), 5);
    assert_eq!(model.history_dates().len(), 5);
    assert_eq!(model.last_training_date().date().to_string(), "2023-05-05");
    assert_eq!(model.seasonalities().len(), 1);
    assert_eq!(model.seasonalities()[0].name, "weekly");
    assert_eq!(model.params().len(), 1);
    assert_eq!(model.uncertainty_samples(), 200);
    assert_eq!(model.history()[2].y, Some(41.2));
}

#[test]
fn test_missing_file() {
    assert_load_failure(load_model("/nonexistent/model_03_prophet.json"));
}

#[test]
fn test_malformed_document() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{ this is not json").unwrap();
    assert_load_failure(load_model(file.path()));

    let file = write_model(&json!({"growth": "linear"}));
    assert_load_failure(load_model(file.path()));
}

#[test]
fn test_unfitted_model() {
    let mut value = fixture_value();
    value["history"] = Value::Null;
    let file = write_model(&value);
    assert_load_failure(load_model(file.path()));
}

#[test]
fn test_corrupt_embedded_history() {
    let mut value = fixture_value();
    value["history_dates"] = json!("{\"name\":\"ds\",\"data\":[\"yesterday\"]}");
    let file = write_model(&value);
    assert_load_failure(load_model(file.path()));
}

#[test]
fn test_parameter_shape_mismatch() {
    let mut value = fixture_value();
    value["params"]["beta"] = json!([[0.02, -0.01, 0.3]]);
    let file = write_model(&value);
    assert_load_failure(load_model(file.path()));

    let mut value = fixture_value();
    value["params"]["delta"] = json!([[0.05, 0.01]]);
    let file = write_model(&value);
    assert_load_failure(load_model(file.path()));

    let mut value = fixture_value();
    value["params"]["k"] = json!([[0.1], [0.2]]);
    let file = write_model(&value);
    assert_load_failure(load_model(file.path()));
}

#[test]
fn test_country_holidays_rejected() {
    let mut value = fixture_value();
    value["country_holidays"] = json!("BR");
    let file = write_model(&value);
    assert_load_failure(load_model(file.path()));
}

#[test]
fn test_load_failure_is_not_recoverable() {
    let err = load_model("/nonexistent/model.json").unwrap_err();
    assert!(!err.is_recoverable());
    assert!(err.to_string().starts_with("Error loading the model"));
    assert!(ForecastError::EmptyForecast.is_recoverable());
}
