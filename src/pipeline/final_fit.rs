//! Refit of the selected family on the full series.

use serde::Serialize;
use tracing::{info, warn};

use crate::core::{Period, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::GridFailure;
use crate::models::{attempt, CandidateSettings, ModelKind};

/// The pipeline's forecast for the quarters after the last observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub model: ModelKind,
    /// Fitted configuration, e.g. the chosen SARIMA order.
    pub descriptor: String,
    pub periods: Vec<Period>,
    pub point: Vec<f64>,
    /// `(lower, upper)` bounds per step; only SARIMA reports them.
    pub intervals: Option<Vec<(f64, f64)>>,
    pub confidence_level: f64,
    /// Failure text when the fit fell back to repeating the last value.
    pub fallback: Option<String>,
    /// Failed SARIMA grid cells of the final fit, in grid order.
    pub grid_failures: Vec<GridFailure>,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Bounds of step `i`, if any.
    pub fn interval(&self, i: usize) -> Option<(f64, f64)> {
        self.intervals.as_ref().and_then(|iv| iv.get(i).copied())
    }
}

/// Refits a model family on the complete observed series.
#[derive(Debug, Clone)]
pub struct FinalFitter {
    settings: CandidateSettings,
    confidence_level: f64,
}

impl FinalFitter {
    pub fn new(settings: CandidateSettings, confidence_level: f64) -> Self {
        Self {
            settings,
            confidence_level,
        }
    }

    /// Forecast `horizon` quarters past the end of `series` with `kind`.
    ///
    /// A failed fit degrades to repeating the last observed value.
    pub fn fit(&self, kind: ModelKind, series: &TimeSeries, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        let level = kind.has_intervals().then_some(self.confidence_level);
        let fit = attempt(kind, series, horizon, level, &self.settings)?;

        if let Some(reason) = &fit.fallback {
            warn!(model = %kind, %reason, "final fit failed; repeating last value");
        }
        info!(model = %kind, descriptor = %fit.descriptor, "final model fitted");

        let intervals = if kind.has_intervals() {
            fit.forecast.intervals()
        } else {
            None
        };
        Ok(ForecastResult {
            model: kind,
            descriptor: fit.descriptor,
            periods: series.future_periods(horizon),
            intervals,
            point: fit.forecast.into_values(),
            confidence_level: self.confidence_level,
            fallback: fit.fallback,
            grid_failures: fit.grid_failures,
        })
    }
}
