//! Simulation-based uncertainty intervals
//!
//! Future trend uncertainty comes from resampling changepoints beyond the
//! training range; observation noise is added on top. Bounds are percentiles
//! of the simulated paths.

use crate::error::{ForecastError, Result};
use crate::model::{Growth, ProphetModel, LOGISTIC_NEEDS_CAP};
use crate::seasonality::{Mode, SeasonalFeatures};
use crate::trend::{flat_trend, piecewise_linear};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Normal, Poisson};
use statrs::distribution::Laplace;

/// Lower and upper bound per date
#[derive(Debug, Clone)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Percentile with linear interpolation between order statistics, ignoring NaN
pub fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Trend path with freshly sampled future changepoints, in data units
fn sample_predictive_trend(
    model: &ProphetModel,
    t: &[f64],
    floor: f64,
    sample: usize,
    rng: &mut StdRng,
) -> Result<Vec<f64>> {
    let params = model.params();
    let k = params.k[sample];
    let m = params.m[sample];
    let deltas = &params.delta[sample];
    let changepoints_t = model.changepoints_t();

    let t_max = t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let rate = changepoints_t.len() as f64 * (t_max - 1.0);
    let n_changes = if t_max > 1.0 && rate > 0.0 {
        let poisson = Poisson::new(rate).map_err(|e| {
            ForecastError::PredictionFailure(format!("invalid changepoint rate {}: {}", rate, e))
        })?;
        let draw: f64 = poisson.sample(rng);
        draw as usize
    } else {
        0
    };

    let mut new_changepoints: Vec<f64> = (0..n_changes)
        .map(|_| 1.0 + rng.gen::<f64>() * (t_max - 1.0))
        .collect();
    new_changepoints.sort_by(|a, b| a.total_cmp(b));

    // Empirical scale of the fitted deltas, plus epsilon
    let scale = if deltas.is_empty() {
        1e-8
    } else {
        deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64 + 1e-8
    };
    let laplace = Laplace::new(0.0, scale).map_err(|e| {
        ForecastError::PredictionFailure(format!("invalid delta scale {}: {}", scale, e))
    })?;

    let mut all_changepoints = changepoints_t.to_vec();
    all_changepoints.extend_from_slice(&new_changepoints);
    let mut all_deltas = deltas.clone();
    all_deltas.extend((0..n_changes).map(|_| laplace.sample(rng)));

    let trend = match model.growth() {
        Growth::Linear => piecewise_linear(t, &all_deltas, k, m, &all_changepoints),
        Growth::Flat => flat_trend(t, m),
        Growth::Logistic => {
            return Err(ForecastError::PredictionFailure(LOGISTIC_NEEDS_CAP.to_string()))
        }
    };

    Ok(trend.into_iter().map(|v| v * model.y_scale() + floor).collect())
}

/// Simulate predictive paths and reduce them to interval bounds
pub fn predict_uncertainty(
    model: &ProphetModel,
    t: &[f64],
    features: &SeasonalFeatures,
    floor: f64,
    rng: &mut StdRng,
) -> Result<Bounds> {
    let params = model.params();
    let n_samples = params.len();
    let per_sample =
        ((model.uncertainty_samples() as f64) / n_samples as f64).ceil().max(1.0) as usize;
    let additive_mask = features.mode_mask(Mode::Additive);
    let multiplicative_mask = features.mode_mask(Mode::Multiplicative);
    let y_scale = model.y_scale();

    let mut paths: Vec<Vec<f64>> = Vec::with_capacity(n_samples * per_sample);
    for sample in 0..n_samples {
        let beta = &params.beta[sample];
        let xb_a: Vec<f64> = features
            .dot(beta, &additive_mask)
            .into_iter()
            .map(|v| v * y_scale)
            .collect();
        let xb_m = features.dot(beta, &multiplicative_mask);
        let noise = Normal::new(0.0, params.sigma_obs[sample]).map_err(|e| {
            ForecastError::PredictionFailure(format!(
                "invalid observation noise {}: {}",
                params.sigma_obs[sample], e
            ))
        })?;

        for _ in 0..per_sample {
            let trend = sample_predictive_trend(model, t, floor, sample, rng)?;
            let path = trend
                .iter()
                .zip(&xb_a)
                .zip(&xb_m)
                .map(|((tr, a), mu)| tr * (1.0 + mu) + a + noise.sample(rng) * y_scale)
                .collect();
            paths.push(path);
        }
    }

    let width = model.interval_width();
    let lower_p = 100.0 * (1.0 - width) / 2.0;
    let upper_p = 100.0 * (1.0 + width) / 2.0;

    let mut lower = Vec::with_capacity(t.len());
    let mut upper = Vec::with_capacity(t.len());
    let mut column = Vec::with_capacity(paths.len());
    for i in 0..t.len() {
        column.clear();
        column.extend(paths.iter().map(|p| p[i]));
        lower.push(percentile(&column, lower_p));
        upper.push(percentile(&column, upper_p));
    }

    Ok(Bounds { lower, upper })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&values, 10.0) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_skips_nan() {
        assert_eq!(percentile(&[f64::NAN, 2.0], 50.0), 2.0);
        assert!(percentile(&[f64::NAN], 50.0).is_nan());
    }
}
