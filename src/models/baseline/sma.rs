//! Simple Moving Average forecasting model.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;

/// Simple Moving Average forecaster.
///
/// Predicts every future step as the mean of the last `window` observations,
/// or of the whole history when it is shorter than the window.
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    window: usize,
    last_mean: Option<f64>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl SimpleMovingAverage {
    /// Create a new SMA with the given window size (at least 1).
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            last_mean: None,
            fitted: None,
            residuals: None,
        }
    }

    /// Get the window size.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Mean of the `window` values ending just before `end`.
    fn mean_before(&self, values: &[f64], end: usize) -> f64 {
        let width = self.window.min(end);
        if width == 0 {
            return f64::NAN;
        }
        values[end - width..end].iter().sum::<f64>() / width as f64
    }
}

impl Default for SimpleMovingAverage {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Forecaster for SimpleMovingAverage {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let n = values.len();
        self.last_mean = Some(self.mean_before(values, n));

        let fitted: Vec<f64> = (0..n).map(|i| self.mean_before(values, i)).collect();
        self.residuals = Some(values.iter().zip(&fitted).map(|(y, f)| y - f).collect());
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let mean = self.last_mean.ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::constant(mean, horizon))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SMA"
    }

    fn descriptor(&self) -> String {
        format!("SMA({})", self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use approx::assert_relative_eq;

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_values(Period::new(2020, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn sma_forecasts_repeating_averages() {
        let ts = series(vec![100.0, 110.0, 90.0, 120.0, 105.0, 115.0, 95.0, 125.0]);

        let mut model = SimpleMovingAverage::new(4);
        model.fit(&ts).unwrap();

        let forecast = model.predict(3).unwrap();
        for pred in forecast.values() {
            assert_relative_eq!(*pred, 110.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn sma_short_history_uses_all_points() {
        let ts = series(vec![1.0, 2.0]);
        let mut model = SimpleMovingAverage::new(4);
        model.fit(&ts).unwrap();
        assert_relative_eq!(model.predict(1).unwrap().values()[0], 1.5, epsilon = 1e-10);
    }

    #[test]
    fn sma_requires_fit_and_data() {
        let model = SimpleMovingAverage::new(4);
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));

        let mut model = SimpleMovingAverage::new(4);
        let empty = TimeSeries::new(vec![], vec![]).unwrap();
        assert!(matches!(model.fit(&empty), Err(ForecastError::EmptyData)));
    }

    #[test]
    fn sma_handles_zero_horizon() {
        let ts = series(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut model = SimpleMovingAverage::new(3);
        model.fit(&ts).unwrap();
        assert!(model.predict(0).unwrap().is_empty());
    }

    #[test]
    fn sma_fitted_values_and_residuals() {
        let ts = series(vec![1.0, 3.0, 5.0, 7.0, 9.0]);

        let mut model = SimpleMovingAverage::new(2);
        model.fit(&ts).unwrap();

        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();

        assert!(fitted[0].is_nan());
        assert_relative_eq!(fitted[1], 1.0, epsilon = 1e-10);
        assert_relative_eq!(fitted[2], 2.0, epsilon = 1e-10);
        assert_relative_eq!(residuals[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn sma_window_is_at_least_one() {
        assert_eq!(SimpleMovingAverage::new(0).window(), 1);
        assert_eq!(SimpleMovingAverage::new(4).name(), "SMA");
    }
}
