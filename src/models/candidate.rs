//! The five competing model families and their fit-or-fallback contract.
//!
//! [`attempt`] never fails because of a numerical problem inside a model:
//! any fit or forecast error, and any non-finite forecast, becomes a
//! "repeat the last observed value" forecast flagged with the reason.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::{GridFailure, SarimaGrid, SarimaSearch};
use crate::models::baseline::{SeasonalNaive, SimpleMovingAverage};
use crate::models::exponential::HoltWinters;
use crate::models::stl_arima::StlArima;
use crate::models::{BoxedForecaster, Forecaster};

/// A candidate model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "seasonal_naive")]
    SeasonalNaive,
    #[serde(rename = "sma4")]
    Sma,
    #[serde(rename = "ets")]
    Ets,
    #[serde(rename = "sarima_grid")]
    SarimaGrid,
    #[serde(rename = "stl_arima")]
    StlArima,
}

impl ModelKind {
    /// Every family, in evaluation order.
    pub const ALL: [ModelKind; 5] = [
        ModelKind::SeasonalNaive,
        ModelKind::Sma,
        ModelKind::Ets,
        ModelKind::SarimaGrid,
        ModelKind::StlArima,
    ];

    /// Stable identifier used in score tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::SeasonalNaive => "seasonal_naive",
            ModelKind::Sma => "sma4",
            ModelKind::Ets => "ets",
            ModelKind::SarimaGrid => "sarima_grid",
            ModelKind::StlArima => "stl_arima",
        }
    }

    /// Whether the final fit reports forecast intervals.
    pub fn has_intervals(&self) -> bool {
        matches!(self, ModelKind::SarimaGrid)
    }

    /// A fresh, unfitted model of this family.
    pub fn build(&self, settings: &CandidateSettings) -> BoxedForecaster {
        match self {
            ModelKind::SeasonalNaive => Box::new(SeasonalNaive::new(settings.seasonal_period)),
            ModelKind::Sma => Box::new(SimpleMovingAverage::new(settings.sma_window)),
            ModelKind::Ets => Box::new(
                HoltWinters::additive(settings.seasonal_period)
                    .with_max_iterations(settings.search.max_iterations),
            ),
            ModelKind::SarimaGrid => Box::new(SarimaGrid::new(
                settings.search.clone(),
                settings.seasonal_period,
            )),
            ModelKind::StlArima => {
                Box::new(StlArima::new(settings.seasonal_period, &settings.search))
            }
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ForecastError::InvalidParameter(format!("unknown model: {s}")))
    }
}

/// Parameters shared by every candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSettings {
    pub seasonal_period: usize,
    pub sma_window: usize,
    pub search: SarimaSearch,
}

impl Default for CandidateSettings {
    fn default() -> Self {
        Self {
            seasonal_period: 4,
            sma_window: 4,
            search: SarimaSearch::default(),
        }
    }
}

/// Outcome of one candidate on one training window.
#[derive(Debug, Clone)]
pub struct ModelFit {
    pub kind: ModelKind,
    pub forecast: Forecast,
    pub descriptor: String,
    /// Why the fallback forecast was used, if it was.
    pub fallback: Option<String>,
    /// Grid cells that failed while fitting, for the SARIMA families.
    pub grid_failures: Vec<GridFailure>,
}

impl ModelFit {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Fit `kind` on `train` and forecast `horizon` steps.
///
/// When `level` is given and the family supports it, the forecast carries
/// intervals at that confidence level. Only an empty `train` is an error.
pub fn attempt(
    kind: ModelKind,
    train: &TimeSeries,
    horizon: usize,
    level: Option<f64>,
    settings: &CandidateSettings,
) -> Result<ModelFit> {
    let last = train.last_value().ok_or(ForecastError::EmptyData)?;

    let (outcome, descriptor, grid_failures) = match kind {
        ModelKind::SarimaGrid => {
            let mut model = SarimaGrid::new(settings.search.clone(), settings.seasonal_period);
            let outcome = fit_and_forecast(&mut model, train, horizon, level);
            let descriptor = model.descriptor();
            (outcome, descriptor, model.take_failures())
        }
        ModelKind::StlArima => {
            let mut model = StlArima::new(settings.seasonal_period, &settings.search);
            let outcome = fit_and_forecast(&mut model, train, horizon, None);
            let descriptor = model.descriptor();
            (outcome, descriptor, model.take_grid_failures())
        }
        _ => {
            let mut model = kind.build(settings);
            let outcome = fit_and_forecast(model.as_mut(), train, horizon, None);
            (outcome, model.descriptor(), Vec::new())
        }
    };

    match outcome {
        Ok(forecast) => Ok(ModelFit {
            kind,
            forecast,
            descriptor,
            fallback: None,
            grid_failures,
        }),
        Err(e) => {
            debug!(model = %kind, error = %e, "model failed; repeating last value");
            Ok(ModelFit {
                kind,
                forecast: Forecast::constant(last, horizon),
                descriptor: format!("{kind} fallback (last value)"),
                fallback: Some(e.to_string()),
                grid_failures,
            })
        }
    }
}

fn fit_and_forecast<M: Forecaster + ?Sized>(
    model: &mut M,
    train: &TimeSeries,
    horizon: usize,
    level: Option<f64>,
) -> Result<Forecast> {
    model.fit(train)?;
    let forecast = match level {
        Some(level) => model.predict_with_intervals(horizon, level)?,
        None => model.predict(horizon)?,
    };
    if forecast.horizon() != horizon {
        return Err(ForecastError::DimensionMismatch {
            expected: horizon,
            got: forecast.horizon(),
        });
    }
    if !forecast.is_finite() {
        return Err(ForecastError::ComputationError(
            "non-finite forecast".to_string(),
        ));
    }
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use approx::assert_relative_eq;

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_values(Period::new(2018, 1).unwrap(), values).unwrap()
    }

    fn settings() -> CandidateSettings {
        CandidateSettings {
            search: SarimaSearch::default().with_max_orders(1, 1),
            ..Default::default()
        }
    }

    #[test]
    fn names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
        assert!("prophet".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Sma.to_string(), "sma4");
    }

    #[test]
    fn builds_fresh_models() {
        let settings = settings();
        for kind in ModelKind::ALL {
            assert!(!kind.build(&settings).is_fitted());
        }
    }

    #[test]
    fn baselines_forecast_directly() {
        let train = series(vec![100.0, 110.0, 90.0, 120.0, 105.0, 115.0, 95.0, 125.0]);

        let naive = attempt(ModelKind::SeasonalNaive, &train, 1, None, &settings()).unwrap();
        assert!(!naive.is_fallback());
        assert_relative_eq!(naive.forecast.values()[0], 105.0);

        let sma = attempt(ModelKind::Sma, &train, 2, None, &settings()).unwrap();
        assert_relative_eq!(sma.forecast.values()[0], 110.0);
        assert_relative_eq!(sma.forecast.values()[1], 110.0);
        assert_eq!(sma.descriptor, "SMA(4)");
    }

    #[test]
    fn ets_failure_falls_back_to_last_value() {
        // Holt-Winters needs two full seasons.
        let train = series(vec![10.0, 12.0, 11.0, 14.0, 13.0]);
        let fit = attempt(ModelKind::Ets, &train, 2, None, &settings()).unwrap();

        assert!(fit.is_fallback());
        assert!(fit.fallback.as_deref().unwrap().contains("insufficient data"));
        assert_eq!(fit.forecast.values(), &[13.0, 13.0]);
        assert_eq!(fit.descriptor, "ets fallback (last value)");
    }

    #[test]
    fn sarima_grid_reports_failures_and_intervals() {
        let values: Vec<f64> = (0..12)
            .map(|i| 200.0 + 2.0 * i as f64 + [5.0, -3.0, 8.0, -10.0][i % 4] + (i as f64).cos())
            .collect();
        let fit = attempt(ModelKind::SarimaGrid, &series(values), 2, Some(0.95), &settings())
            .unwrap();

        assert!(!fit.is_fallback());
        assert!(fit.forecast.has_intervals());
        assert!(fit.descriptor.starts_with("SARIMA("));
        assert!(!fit.grid_failures.is_empty());
    }

    #[test]
    fn constant_series_grid_falls_back() {
        let fit = attempt(ModelKind::SarimaGrid, &series(vec![50.0; 10]), 2, None, &settings())
            .unwrap();
        assert!(fit.is_fallback());
        assert_eq!(fit.forecast.values(), &[50.0, 50.0]);
        assert!(!fit.grid_failures.is_empty());
    }

    #[test]
    fn non_sarima_families_never_carry_intervals() {
        let train = series(vec![100.0, 110.0, 90.0, 120.0, 105.0, 115.0, 95.0, 125.0]);
        let fit = attempt(ModelKind::Sma, &train, 2, Some(0.95), &settings()).unwrap();
        assert!(!fit.forecast.has_intervals());
        assert!(!ModelKind::Ets.has_intervals());
        assert!(ModelKind::SarimaGrid.has_intervals());
    }
}
