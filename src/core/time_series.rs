//! Quarterly time series: ordered (period, value) observations.

use crate::core::period::{Period, QUARTERS_PER_YEAR};
use crate::error::{ForecastError, Result};

/// A univariate quarterly series.
///
/// Periods are strictly increasing and every value is finite. Missing
/// observations are removed before a series is built, never imputed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    periods: Vec<Period>,
    values: Vec<f64>,
    name: Option<String>,
}

impl TimeSeries {
    /// Create a series, validating ordering and finiteness.
    pub fn new(periods: Vec<Period>, values: Vec<f64>) -> Result<Self> {
        if periods.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: periods.len(),
                got: values.len(),
            });
        }

        for i in 1..periods.len() {
            if periods[i] <= periods[i - 1] {
                return Err(ForecastError::PeriodOrder(format!(
                    "periods must be strictly increasing ({} follows {})",
                    periods[i],
                    periods[i - 1]
                )));
            }
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        Ok(Self {
            periods,
            values,
            name: None,
        })
    }

    /// Build a contiguous series starting at `start`.
    pub fn from_values(start: Period, values: Vec<f64>) -> Result<Self> {
        let periods = (0..values.len()).map(|i| start.advance(i)).collect();
        Self::new(periods, values)
    }

    /// Attach a display name (usually the target column).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Same periods, different values (e.g. a deseasonalised component).
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        let mut series = Self::new(self.periods.clone(), values)?;
        series.name = self.name.clone();
        Ok(series)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Observed values in chronological order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Nominal number of observations per year.
    pub fn frequency(&self) -> usize {
        QUARTERS_PER_YEAR
    }

    pub fn first_period(&self) -> Option<Period> {
        self.periods.first().copied()
    }

    pub fn last_period(&self) -> Option<Period> {
        self.periods.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Sub-series over `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }
        Ok(Self {
            periods: self.periods[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            name: self.name.clone(),
        })
    }

    /// The `horizon` periods following the last observation.
    pub fn future_periods(&self, horizon: usize) -> Vec<Period> {
        match self.last_period() {
            Some(last) => (1..=horizon).map(|k| last.advance(k)).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(year: i32, quarter: u8) -> Period {
        Period::new(year, quarter).unwrap()
    }

    #[test]
    fn builds_contiguous_series() {
        let ts = TimeSeries::from_values(q(2020, 3), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.periods(), &[q(2020, 3), q(2020, 4), q(2021, 1)]);
        assert_eq!(ts.frequency(), 4);
        assert_eq!(ts.last_value(), Some(3.0));
    }

    #[test]
    fn rejects_unordered_periods() {
        let result = TimeSeries::new(vec![q(2020, 2), q(2020, 1)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::PeriodOrder(_))));

        let result = TimeSeries::new(vec![q(2020, 2), q(2020, 2)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::PeriodOrder(_))));
    }

    #[test]
    fn rejects_non_finite_values() {
        let result = TimeSeries::from_values(q(2020, 1), vec![1.0, f64::NAN]);
        assert!(matches!(result, Err(ForecastError::MissingValues)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let result = TimeSeries::new(vec![q(2020, 1)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::DimensionMismatch { .. })));
    }

    #[test]
    fn slice_keeps_periods() {
        let ts = TimeSeries::from_values(q(2020, 1), (0..8).map(f64::from).collect())
            .unwrap()
            .with_name("loans");
        let head = ts.slice(0, 5).unwrap();
        assert_eq!(head.len(), 5);
        assert_eq!(head.last_period(), Some(q(2021, 1)));
        assert_eq!(head.name(), Some("loans"));
        assert!(ts.slice(3, 9).is_err());
    }

    #[test]
    fn future_periods_follow_last_observation() {
        let ts = TimeSeries::from_values(q(2024, 3), vec![1.0, 2.0]).unwrap();
        assert_eq!(ts.future_periods(2), vec![q(2025, 1), q(2025, 2)]);
    }
}
