//! STL + ARIMA: decomposition-based forecasting.
//!
//! The series is decomposed with robust STL. The deseasonalised component
//! (trend + remainder) is forecast with a non-seasonal SARIMA grid search,
//! and the last observed seasonal cycle is tiled over the horizon and added
//! back.

use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::{GridFailure, SarimaGrid, SarimaSearch};
use crate::models::Forecaster;
use crate::seasonality::STL;

/// How the deseasonalised component is projected.
#[derive(Debug, Clone)]
enum TrendProjection {
    /// Fitted ARIMA from the order search.
    Arima(SarimaGrid),
    /// No order converged; the last deseasonalised value is repeated.
    LastValue(f64),
}

/// STL decomposition followed by ARIMA on the deseasonalised series.
#[derive(Debug, Clone)]
pub struct StlArima {
    period: usize,
    search: SarimaSearch,
    /// Last `period` seasonal values; zeros when STL failed.
    last_cycle: Option<Vec<f64>>,
    projection: Option<TrendProjection>,
    stl_failure: Option<String>,
    grid_failures: Vec<GridFailure>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl StlArima {
    /// `search` seasonal sets are ignored; only `P = D = Q = 0` is searched.
    pub fn new(period: usize, search: &SarimaSearch) -> Self {
        Self {
            period: period.max(2),
            search: search.non_seasonal(),
            last_cycle: None,
            projection: None,
            stl_failure: None,
            grid_failures: Vec::new(),
            fitted: None,
            residuals: None,
        }
    }

    /// Why STL was skipped on the last fit, if it was.
    pub fn stl_failure(&self) -> Option<&str> {
        self.stl_failure.as_deref()
    }

    /// Failed grid cells from the last fit.
    pub fn grid_failures(&self) -> &[GridFailure] {
        &self.grid_failures
    }

    /// Take ownership of the recorded grid failures.
    pub fn take_grid_failures(&mut self) -> Vec<GridFailure> {
        std::mem::take(&mut self.grid_failures)
    }

    /// Tile the last seasonal cycle over `horizon` steps.
    fn seasonal_projection(&self, last_cycle: &[f64], horizon: usize) -> Vec<f64> {
        if last_cycle.is_empty() {
            return vec![0.0; horizon];
        }
        last_cycle.iter().copied().cycle().take(horizon).collect()
    }
}

impl Forecaster for StlArima {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        self.stl_failure = None;
        let stl = STL::new(self.period).robust();
        let (deseasonalized, seasonal, last_cycle) = match stl.decompose(values) {
            Ok(decomposition) => {
                let last_cycle = decomposition.last_cycle(self.period).to_vec();
                (decomposition.deseasonalized(), decomposition.seasonal, last_cycle)
            }
            Err(e) => {
                debug!(error = %e, "STL failed; forecasting the raw series");
                self.stl_failure = Some(e.to_string());
                (values.to_vec(), vec![0.0; values.len()], vec![0.0; self.period])
            }
        };

        let deseasonalized_series = series.with_values(deseasonalized.clone())?;
        let mut grid = SarimaGrid::new(self.search.clone(), self.period);
        let projection = match grid.fit(&deseasonalized_series) {
            Ok(()) => {
                self.grid_failures = grid.take_failures();
                TrendProjection::Arima(grid)
            }
            Err(e) => {
                debug!(error = %e, "ARIMA on deseasonalised series failed; repeating its last value");
                self.grid_failures = grid.take_failures();
                let last = deseasonalized.last().copied().ok_or(ForecastError::EmptyData)?;
                TrendProjection::LastValue(last)
            }
        };

        let fitted: Vec<f64> = match &projection {
            TrendProjection::Arima(grid) => match grid.fitted_values() {
                Some(trend_fit) => trend_fit.iter().zip(&seasonal).map(|(t, s)| t + s).collect(),
                None => vec![f64::NAN; values.len()],
            },
            TrendProjection::LastValue(_) => vec![f64::NAN; values.len()],
        };
        self.residuals = Some(values.iter().zip(&fitted).map(|(y, f)| y - f).collect());
        self.fitted = Some(fitted);

        self.last_cycle = Some(last_cycle);
        self.projection = Some(projection);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let projection = self.projection.as_ref().ok_or(ForecastError::FitRequired)?;
        let last_cycle = self.last_cycle.as_ref().ok_or(ForecastError::FitRequired)?;

        let trend = match projection {
            TrendProjection::Arima(grid) => grid.predict(horizon)?,
            TrendProjection::LastValue(v) => Forecast::constant(*v, horizon),
        };
        trend.shifted_by(&self.seasonal_projection(last_cycle, horizon))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "STL+ARIMA"
    }

    fn descriptor(&self) -> String {
        let trend = match &self.projection {
            Some(TrendProjection::Arima(grid)) => match grid.selected_order() {
                Some(order) => format!("ARIMA({},{},{})", order.p, order.d, order.q),
                None => "ARIMA".to_string(),
            },
            Some(TrendProjection::LastValue(_)) => "last value".to_string(),
            None => "ARIMA".to_string(),
        };
        if self.stl_failure.is_some() {
            format!("{trend} (no STL)")
        } else {
            format!("STL+{trend}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use approx::assert_relative_eq;

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_values(Period::new(2016, 1).unwrap(), values).unwrap()
    }

    fn search() -> SarimaSearch {
        SarimaSearch::default().with_max_orders(1, 1)
    }

    #[test]
    fn forecast_adds_back_last_seasonal_cycle() {
        let pattern = [8.0, -3.0, 5.0, -10.0];
        let values: Vec<f64> = (0..20).map(|i| 100.0 + 1.5 * i as f64 + pattern[i % 4]).collect();

        let mut model = StlArima::new(4, &search());
        model.fit(&series(values)).unwrap();
        assert!(model.stl_failure().is_none());

        let forecast = model.predict(4).unwrap();
        let expected: Vec<f64> = (20..24).map(|i| 100.0 + 1.5 * i as f64 + pattern[i % 4]).collect();
        for (f, e) in forecast.values().iter().zip(&expected) {
            assert_relative_eq!(*f, *e, epsilon = 3.0);
        }
        assert!(model.descriptor().starts_with("STL+"));
    }

    #[test]
    fn short_series_skips_stl() {
        let values = vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0];
        let mut model = StlArima::new(4, &search());
        model.fit(&series(values)).unwrap();

        assert!(model.stl_failure().is_some());
        assert!(model.descriptor().ends_with("(no STL)"));
        assert_eq!(model.predict(2).unwrap().horizon(), 2);
    }

    #[test]
    fn constant_series_repeats_last_value() {
        // Too short for STL; every order fits exactly, so no AIC is finite.
        let mut model = StlArima::new(4, &search());
        model.fit(&series(vec![50.0; 6])).unwrap();

        for v in model.predict(3).unwrap().values() {
            assert_relative_eq!(*v, 50.0, epsilon = 1e-9);
        }
        assert!(!model.grid_failures().is_empty());
    }

    #[test]
    fn seasonal_projection_tiles_cycle() {
        let model = StlArima::new(4, &search());
        assert_eq!(
            model.seasonal_projection(&[1.0, 2.0, 3.0, 4.0], 6),
            vec![1.0, 2.0, 3.0, 4.0, 1.0, 2.0]
        );
    }

    #[test]
    fn requires_fit() {
        let model = StlArima::new(4, &search());
        assert!(matches!(model.predict(1), Err(ForecastError::FitRequired)));
        assert_eq!(model.name(), "STL+ARIMA");
    }
}
