//! Property-based tests for metrics, baselines and fold generation.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated quarterly series.

use approx::assert_relative_eq;
use quarterly_forecast::core::{Period, TimeSeries};
use quarterly_forecast::evaluation::RollingOrigin;
use quarterly_forecast::models::baseline::{SeasonalNaive, SimpleMovingAverage};
use quarterly_forecast::models::Forecaster;
use quarterly_forecast::utils::{mase, smape};
use proptest::prelude::*;

/// Create a quarterly TimeSeries starting in 2010Q1.
fn make_ts(values: &[f64]) -> TimeSeries {
    TimeSeries::from_values(Period::new(2010, 1).unwrap(), values.to_vec()).unwrap()
}

/// Strategy for positive series values typical of sales figures.
fn positive_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, min_len..max_len)
}

/// Strategy for paired actual/predicted slices of equal length.
fn paired_strategy() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..12).prop_flat_map(|len| {
        (
            prop::collection::vec(-500.0..500.0_f64, len),
            prop::collection::vec(-500.0..500.0_f64, len),
        )
    })
}

// =============================================================================
// Property: sMAPE is symmetric and zero on perfect forecasts
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn smape_is_symmetric((actual, predicted) in paired_strategy()) {
        let a = smape(&actual, &predicted);
        let b = smape(&predicted, &actual);
        if a.is_nan() {
            prop_assert!(b.is_nan());
        } else {
            prop_assert!((a - b).abs() < 1e-12);
            prop_assert!((0.0..=2.0).contains(&a));
        }
    }

    #[test]
    fn smape_of_identical_series_is_zero(actual in positive_values_strategy(1, 20)) {
        prop_assert_eq!(smape(&actual, &actual), 0.0);
    }
}

// =============================================================================
// Property: MASE definedness
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn mase_undefined_for_single_point_train(
        train in positive_values_strategy(0, 2),
        (actual, predicted) in paired_strategy()
    ) {
        prop_assert!(mase(&train, &actual, &predicted).is_nan());
    }

    #[test]
    fn mase_finite_and_non_negative_with_varying_train(
        train in positive_values_strategy(2, 30),
        (actual, predicted) in paired_strategy()
    ) {
        // Strictly increasing training data has a non-zero naive scale.
        let train: Vec<f64> = train.iter().enumerate().map(|(i, v)| v + 1000.0 * i as f64).collect();
        let value = mase(&train, &actual, &predicted);
        prop_assert!(value.is_finite());
        prop_assert!(value >= 0.0);
    }
}

// =============================================================================
// Property: Baseline identities
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn seasonal_naive_first_step_is_four_back(
        values in positive_values_strategy(4, 40),
        horizon in 1usize..9
    ) {
        let mut model = SeasonalNaive::new(4);
        model.fit(&make_ts(&values)).unwrap();
        let forecast = model.predict(horizon).unwrap();

        prop_assert_eq!(forecast.horizon(), horizon);
        prop_assert_eq!(forecast.values()[0], values[values.len() - 4]);
    }

    #[test]
    fn sma_repeats_mean_of_last_four(
        values in positive_values_strategy(1, 40),
        horizon in 1usize..9
    ) {
        let mut model = SimpleMovingAverage::new(4);
        model.fit(&make_ts(&values)).unwrap();
        let forecast = model.predict(horizon).unwrap();

        let tail = &values[values.len().saturating_sub(4)..];
        let expected = tail.iter().sum::<f64>() / tail.len() as f64;
        for v in forecast.values() {
            assert_relative_eq!(*v, expected, epsilon = 1e-9);
        }
        prop_assert!(forecast.values().windows(2).all(|w| w[0] == w[1]));
    }
}

// =============================================================================
// Property: Fold count and shape
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn fold_count_matches_formula(
        n in 1usize..40,
        min_train in 1usize..12,
        horizon in 1usize..5
    ) {
        let ts = make_ts(&vec![1.0; n]);
        let cv = RollingOrigin::new(min_train, horizon);
        let expected = (n + 1).saturating_sub(min_train + horizon);

        prop_assert_eq!(cv.fold_count(n), expected);
        match cv.folds(&ts) {
            Ok(folds) => {
                prop_assert_eq!(folds.len(), expected);
                for (i, fold) in folds.iter().enumerate() {
                    prop_assert_eq!(fold.train.len(), min_train + i);
                    prop_assert_eq!(fold.test.len(), horizon);
                }
            }
            Err(_) => prop_assert_eq!(expected, 0),
        }
    }
}

// =============================================================================
// Property: Period labels
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn roman_labels_parse(year in 1900i32..2100, quarter in 1u8..=4) {
        let roman = ["I", "II", "III", "IV"][quarter as usize - 1];
        let period = Period::parse_label(&format!("{year} {roman}")).unwrap();
        prop_assert_eq!(period.year(), year);
        prop_assert_eq!(period.quarter(), quarter);
    }

    #[test]
    fn advance_is_additive(year in 1900i32..2100, quarter in 1u8..=4, a in 0usize..40, b in 0usize..40) {
        let p = Period::new(year, quarter).unwrap();
        prop_assert_eq!(p.advance(a).advance(b), p.advance(a + b));
        prop_assert!(p.advance(a + 1) > p.advance(a));
    }
}
