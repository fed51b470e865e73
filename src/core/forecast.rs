//! Point forecasts with optional prediction intervals.

use crate::error::{ForecastError, Result};

/// A univariate forecast path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        if lower.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: lower.len(),
            });
        }
        if upper.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: upper.len(),
            });
        }
        Ok(Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Repeat a single value for every step.
    pub fn constant(value: f64, horizon: usize) -> Self {
        Self::from_values(vec![value; horizon])
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn values(&self) -> &[f64] {
        &self.point
    }

    pub fn into_values(self) -> Vec<f64> {
        self.point
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// (lower, upper) pairs per step, when intervals are present.
    pub fn intervals(&self) -> Option<Vec<(f64, f64)>> {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => {
                Some(lower.iter().copied().zip(upper.iter().copied()).collect())
            }
            _ => None,
        }
    }

    /// Add `offsets` step by step to the point path. Intervals are shifted too.
    pub fn shifted_by(mut self, offsets: &[f64]) -> Result<Self> {
        if offsets.len() != self.point.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.point.len(),
                got: offsets.len(),
            });
        }
        let shift = |path: &mut Vec<f64>| {
            for (v, o) in path.iter_mut().zip(offsets) {
                *v += o;
            }
        };
        shift(&mut self.point);
        if let Some(lower) = self.lower.as_mut() {
            shift(lower);
        }
        if let Some(upper) = self.upper.as_mut() {
            shift(upper);
        }
        Ok(self)
    }

    /// True when every point (and bound) is finite.
    pub fn is_finite(&self) -> bool {
        let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
        finite(&self.point)
            && self.lower.as_deref().map_or(true, finite)
            && self.upper.as_deref().map_or(true, finite)
    }
}
