//! Forecaster trait defining the common interface for all candidate models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
/// A model instance is fitted once; cross-validation builds a fresh instance
/// for every fold.
pub trait Forecaster: Send {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with confidence intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        // Models without an error model report point forecasts only.
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Human-readable description of the fitted configuration,
    /// e.g. `SARIMA(1,1,0)(0,1,1,4)`.
    fn descriptor(&self) -> String {
        self.name().to_string()
    }

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use quarterly_forecast::models::{BoxedForecaster, Forecaster};
/// use quarterly_forecast::models::baseline::SimpleMovingAverage;
///
/// let model: BoxedForecaster = Box::new(SimpleMovingAverage::new(4));
/// assert_eq!(model.name(), "SMA");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use crate::models::baseline::{SeasonalNaive, SimpleMovingAverage};

    fn make_test_series(n: usize) -> TimeSeries {
        let values: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        TimeSeries::from_values(Period::new(2020, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn boxed_forecasters_share_the_interface() {
        let ts = make_test_series(12);
        let mut models: Vec<BoxedForecaster> = vec![
            Box::new(SeasonalNaive::new(4)),
            Box::new(SimpleMovingAverage::new(4)),
        ];

        for model in models.iter_mut() {
            assert!(!model.is_fitted());
            model.fit(&ts).unwrap();
            assert!(model.is_fitted());
            let forecast = model.predict(3).unwrap();
            assert_eq!(forecast.horizon(), 3);
        }
    }

    #[test]
    fn default_intervals_fall_back_to_points() {
        let ts = make_test_series(8);
        let mut model = SimpleMovingAverage::new(4);
        model.fit(&ts).unwrap();
        let forecast = model.predict_with_intervals(2, 0.95).unwrap();
        assert!(!forecast.has_intervals());
        assert_eq!(model.descriptor(), "SMA(4)");
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = SeasonalNaive::new(4);
        assert!(model.predict(1).is_err());
    }
}
