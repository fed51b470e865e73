//! Accuracy metrics for forecast evaluation.
//!
//! Both metrics return `f64::NAN` for undefined results instead of an error so
//! that a single degenerate fold never interrupts cross-validation.

/// Symmetric mean absolute percentage error as a fraction in `[0, 2]`.
///
/// `2 * mean(|a - p| / (|a| + |p|))` over the points whose denominator is
/// non-zero. Points where both actual and predicted are zero are removed
/// from the pool before averaging.
///
/// Returns NaN when the inputs are empty or of different lengths, when any
/// value is non-finite, or when every point is degenerate.
pub fn smape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    if !all_finite(actual) || !all_finite(predicted) {
        return f64::NAN;
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for (a, p) in actual.iter().zip(predicted.iter()) {
        let denom = a.abs() + p.abs();
        if denom == 0.0 {
            continue;
        }
        sum += (a - p).abs() / denom;
        count += 1;
    }

    if count == 0 {
        return f64::NAN;
    }
    2.0 * sum / count as f64
}

/// Mean absolute scaled error.
///
/// `mean(|actual - predicted|) / mean(|diff(train)|)`, scaled by the
/// in-sample one-step naive error of the training window passed in. In
/// cross-validation that window is the fold's own training prefix.
///
/// Returns NaN when `train` has fewer than two points, when the scale is zero
/// or non-finite, or when the forecast error is non-finite.
pub fn mase(train: &[f64], actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    if !all_finite(actual) || !all_finite(predicted) {
        return f64::NAN;
    }
    if train.len() < 2 {
        return f64::NAN;
    }

    let scale = train.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>()
        / (train.len() - 1) as f64;
    if scale == 0.0 || !scale.is_finite() {
        return f64::NAN;
    }

    let error = mae(actual, predicted);
    if !error.is_finite() {
        return f64::NAN;
    }
    error / scale
}

/// Mean absolute error between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Mean of the finite entries; NaN when there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn smape_perfect_prediction_is_zero() {
        let a = [100.0, 110.0, 90.0];
        assert_relative_eq!(smape(&a, &a), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn smape_known_value() {
        // |100-110| / 210 = 0.047619..., times 2
        assert_relative_eq!(smape(&[100.0], &[110.0]), 2.0 * 10.0 / 210.0, epsilon = 1e-12);
    }

    #[test]
    fn smape_is_symmetric() {
        let a = [1.0, 5.0, -3.0, 8.0];
        let p = [2.0, 4.0, -1.0, 0.5];
        assert_eq!(smape(&a, &p), smape(&p, &a));
    }

    #[test]
    fn smape_drops_double_zero_points_from_mean() {
        // The (0, 0) point is excluded rather than averaged in as zero.
        let value = smape(&[0.0, 100.0], &[0.0, 110.0]);
        assert_relative_eq!(value, smape(&[100.0], &[110.0]), epsilon = 1e-12);
    }

    #[test]
    fn smape_undefined_cases() {
        assert!(smape(&[0.0, 0.0], &[0.0, 0.0]).is_nan());
        assert!(smape(&[1.0, f64::NAN], &[1.0, 2.0]).is_nan());
        assert!(smape(&[1.0, 2.0], &[1.0, f64::INFINITY]).is_nan());
        assert!(smape(&[], &[]).is_nan());
        assert!(smape(&[1.0], &[1.0, 2.0]).is_nan());
    }

    #[test]
    fn mase_known_value() {
        // train diffs: 10, 20 -> scale 15; mae = 3
        let value = mase(&[100.0, 110.0, 90.0], &[95.0, 100.0], &[98.0, 97.0]);
        assert_relative_eq!(value, 3.0 / 15.0, epsilon = 1e-12);
    }

    #[test]
    fn mase_requires_two_training_points() {
        assert!(mase(&[5.0], &[1.0], &[1.0]).is_nan());
        assert!(mase(&[], &[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn mase_undefined_for_constant_training() {
        assert!(mase(&[50.0; 10], &[50.0], &[50.0]).is_nan());
    }

    #[test]
    fn mase_undefined_for_non_finite_forecast() {
        assert!(mase(&[1.0, 2.0, 3.0], &[4.0], &[f64::NAN]).is_nan());
    }

    #[test]
    fn mase_is_non_negative() {
        let value = mase(&[1.0, 3.0, 2.0, 5.0], &[4.0, 6.0], &[5.0, 3.0]);
        assert!(value.is_finite() && value >= 0.0);
    }

    #[test]
    fn nan_mean_skips_nan() {
        assert_relative_eq!(nan_mean(&[1.0, f64::NAN, 3.0]), 2.0, epsilon = 1e-12);
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
        assert!(nan_mean(&[]).is_nan());
    }

    #[test]
    fn standalone_mae() {
        assert_relative_eq!(mae(&[1.0, 2.0, 3.0], &[1.5, 2.5, 3.5]), 0.5, epsilon = 1e-10);
    }
}
