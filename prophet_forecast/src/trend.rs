//! Trend components on the scaled time axis

/// Piecewise linear trend with rate changes at `changepoints_t`
///
/// Each changepoint at or before `t` adds its delta to the rate and shifts the
/// offset so the curve stays continuous.
pub fn piecewise_linear(
    t: &[f64],
    deltas: &[f64],
    k: f64,
    m: f64,
    changepoints_t: &[f64],
) -> Vec<f64> {
    t.iter()
        .map(|&ti| {
            let mut k_t = k;
            let mut m_t = m;
            for (&cp, &delta) in changepoints_t.iter().zip(deltas.iter()) {
                if cp <= ti {
                    k_t += delta;
                    m_t -= cp * delta;
                }
            }
            k_t * ti + m_t
        })
        .collect()
}

/// Constant trend at the offset `m`
pub fn flat_trend(t: &[f64], m: f64) -> Vec<f64> {
    vec![m; t.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_without_changepoints() {
        let trend = piecewise_linear(&[0.0, 0.5, 1.0], &[], 2.0, 1.0, &[]);
        assert_eq!(trend, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_linear_is_continuous_at_changepoint() {
        let t = [0.0, 0.5, 1.0];
        let trend = piecewise_linear(&t, &[1.0], 1.0, 0.0, &[0.5]);

        // Slope doubles after 0.5 without a jump
        assert!((trend[1] - 0.5).abs() < 1e-12);
        assert!((trend[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_flat_trend() {
        assert_eq!(flat_trend(&[0.0, 3.0], 4.2), vec![4.2, 4.2]);
    }
}
