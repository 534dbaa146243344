//! Loading model artifacts from disk

use crate::error::{ForecastError, Result};
use crate::model::ProphetModel;
use std::fs;
use std::path::Path;

/// Default location of the serialized ozone model
pub const DEFAULT_MODEL_PATH: &str = "model_03_prophet.json";

/// Read and reconstruct the model stored at `path`
///
/// Every failure (missing file, malformed JSON, inconsistent parameters) is a
/// `ForecastError::LoadFailure`; there is no partially loaded model.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ProphetModel> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| ForecastError::LoadFailure(format!("{}: {}", path.display(), e)))?;

    let model = ProphetModel::from_json_str(&text)?;
    tracing::info!(
        path = %path.display(),
        history = model.history_dates().len(),
        last_training_date = %model.last_training_date(),
        "model loaded"
    );
    Ok(model)
}
