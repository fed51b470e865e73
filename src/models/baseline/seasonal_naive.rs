//! Seasonal Naive forecasting model.
//!
//! Forecasts by repeating the value from the same season in the previous cycle.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;

/// Seasonal Naive forecaster.
///
/// Step `k` of the forecast equals the observation `period` quarters before
/// it, so the last observed cycle is repeated. With less than one full
/// season of history the last observation is repeated instead.
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
    history: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl SeasonalNaive {
    /// Create a new SeasonalNaive model with the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            history: None,
            fitted: None,
            residuals: None,
        }
    }

    /// Get the seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// True when the history covers at least one season.
    fn is_seasonal(&self, n: usize) -> bool {
        n >= self.period
    }
}

impl Default for SeasonalNaive {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Forecaster for SeasonalNaive {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        // Fitted values: y_hat[t] = y[t - period]
        let fitted: Vec<f64> = (0..values.len())
            .map(|i| {
                if i < self.period {
                    f64::NAN
                } else {
                    values[i - self.period]
                }
            })
            .collect();
        let residuals = values
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();

        self.history = Some(values.to_vec());
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let history = self.history.as_ref().ok_or(ForecastError::FitRequired)?;
        let n = history.len();

        if !self.is_seasonal(n) {
            let last = history.last().copied().ok_or(ForecastError::EmptyData)?;
            return Ok(Forecast::constant(last, horizon));
        }

        let predictions = (0..horizon)
            .map(|h| history[n - self.period + (h % self.period)])
            .collect();
        Ok(Forecast::from_values(predictions))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SeasonalNaive"
    }

    fn descriptor(&self) -> String {
        match &self.history {
            Some(h) if !self.is_seasonal(h.len()) => "SeasonalNaive(last value)".to_string(),
            _ => format!("SeasonalNaive({})", self.period),
        }
    }
}
