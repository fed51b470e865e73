//! STL (Seasonal-Trend decomposition using LOESS) implementation.
//!
//! STL decomposes a time series into three components:
//! - Trend: The underlying long-term pattern
//! - Seasonal: The repeating seasonal pattern
//! - Remainder: The residual after removing trend and seasonal
//!
//! The procedure follows Cleveland et al. (1990): cycle-subseries are
//! smoothed with local-linear LOESS and extended one cycle at each end, a
//! low-pass filter removes any trend leakage from the seasonal estimate, and
//! the trend is a LOESS fit of the deseasonalised series. Robust fitting
//! reweights observations by bisquare weights of the remainder between
//! passes.

use crate::error::{ForecastError, Result};
use crate::utils::stats::median;

/// Result of STL decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct STLResult {
    /// Trend component.
    pub trend: Vec<f64>,
    /// Seasonal component.
    pub seasonal: Vec<f64>,
    /// Remainder component.
    pub remainder: Vec<f64>,
}

impl STLResult {
    /// Trend plus remainder, i.e. the series with seasonality removed.
    pub fn deseasonalized(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.remainder)
            .map(|(t, r)| t + r)
            .collect()
    }

    /// The last `period` seasonal values, in time order.
    pub fn last_cycle(&self, period: usize) -> &[f64] {
        let n = self.seasonal.len();
        &self.seasonal[n.saturating_sub(period)..]
    }
}

/// STL decomposition configuration and algorithm.
#[derive(Debug, Clone)]
pub struct STL {
    /// Seasonal period.
    seasonal_period: usize,
    /// Seasonal LOESS span (ns).
    seasonal_smoothness: usize,
    /// Trend LOESS span (nt).
    trend_smoothness: usize,
    /// Low-pass LOESS span (nl).
    low_pass_smoothness: usize,
    /// Number of inner iterations.
    inner_iterations: usize,
    /// Number of outer (robustness) iterations.
    outer_iterations: usize,
}

impl STL {
    /// Create a new STL decomposer with the given seasonal period.
    pub fn new(seasonal_period: usize) -> Self {
        let period = seasonal_period.max(2);
        let ns = 7;
        Self {
            seasonal_period: period,
            seasonal_smoothness: ns,
            trend_smoothness: default_trend_span(period, ns),
            low_pass_smoothness: next_odd(period + 1),
            inner_iterations: 5,
            outer_iterations: 0,
        }
    }

    /// Enable robust fitting: 2 inner and 15 outer iterations.
    pub fn robust(mut self) -> Self {
        self.inner_iterations = 2;
        self.outer_iterations = 15;
        self
    }

    /// Decompose the time series.
    pub fn decompose(&self, series: &[f64]) -> Result<STLResult> {
        let n = series.len();
        let period = self.seasonal_period;
        if n < 2 * period {
            return Err(ForecastError::InsufficientData {
                needed: 2 * period,
                got: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut weights = vec![1.0; n];

        for pass in 0..=self.outer_iterations {
            for _ in 0..self.inner_iterations {
                let detrended: Vec<f64> =
                    series.iter().zip(&trend).map(|(y, t)| y - t).collect();

                // Length n + 2 * period.
                let cycle = self.smooth_cycle_subseries(&detrended, &weights);
                let low_pass = self.low_pass_filter(&cycle);
                for i in 0..n {
                    seasonal[i] = cycle[period + i] - low_pass[i];
                }

                let deseasonalized: Vec<f64> =
                    series.iter().zip(&seasonal).map(|(y, s)| y - s).collect();
                trend = loess_fit(&deseasonalized, &weights, self.trend_smoothness);
            }

            if pass < self.outer_iterations {
                let remainder = remainder_of(series, &seasonal, &trend);
                weights = robustness_weights(&remainder);
            }
        }

        let remainder = remainder_of(series, &seasonal, &trend);
        if remainder.iter().chain(&trend).any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "STL produced non-finite components".to_string(),
            ));
        }

        Ok(STLResult {
            trend,
            seasonal,
            remainder,
        })
    }

    /// Smooth each cycle-subseries and extend it one cycle on both ends.
    fn smooth_cycle_subseries(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        let n = detrended.len();
        let period = self.seasonal_period;
        let mut result = vec![0.0; n + 2 * period];

        for pos in 0..period {
            let values: Vec<f64> = detrended.iter().skip(pos).step_by(period).copied().collect();
            let sub_weights: Vec<f64> = weights.iter().skip(pos).step_by(period).copied().collect();
            let len = values.len();

            // Evaluate at -1, 0, .., len on the subseries' own index.
            for k in 0..len + 2 {
                let x = k as f64 - 1.0;
                let fallback = values[k.saturating_sub(1).min(len - 1)];
                let smoothed = loess_at(&values, &sub_weights, self.seasonal_smoothness, x)
                    .unwrap_or(fallback);
                result[pos + k * period] = smoothed;
            }
        }

        result
    }

    /// Moving averages of length `period`, `period` and 3, then LOESS.
    fn low_pass_filter(&self, cycle: &[f64]) -> Vec<f64> {
        let period = self.seasonal_period;
        let ma = moving_average(&moving_average(&moving_average(cycle, period), period), 3);
        let ones = vec![1.0; ma.len()];
        loess_fit(&ma, &ones, self.low_pass_smoothness)
    }
}

impl Default for STL {
    fn default() -> Self {
        Self::new(4)
    }
}

fn next_odd(x: usize) -> usize {
    if x % 2 == 0 {
        x + 1
    } else {
        x
    }
}

/// Smallest odd integer >= 1.5 * period / (1 - 1.5 / ns).
fn default_trend_span(period: usize, ns: usize) -> usize {
    let raw = (1.5 * period as f64 / (1.0 - 1.5 / ns as f64)).ceil() as usize;
    next_odd(raw.max(3))
}

fn remainder_of(series: &[f64], seasonal: &[f64], trend: &[f64]) -> Vec<f64> {
    series
        .iter()
        .zip(seasonal)
        .zip(trend)
        .map(|((y, s), t)| y - s - t)
        .collect()
}

/// Trailing moving average; output is `window - 1` shorter than the input.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || series.len() < window {
        return Vec::new();
    }
    series
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// LOESS evaluated at every index of `values`.
fn loess_fit(values: &[f64], weights: &[f64], span: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| loess_at(values, weights, span, i as f64).unwrap_or(values[i]))
        .collect()
}

/// Local-linear LOESS with tricube weights at position `x`.
///
/// The neighbourhood is the `span` nearest indices; when `span` exceeds the
/// series length the bandwidth is widened by the excess. Returns `None` when
/// every weight in the neighbourhood is zero.
fn loess_at(values: &[f64], weights: &[f64], span: usize, x: f64) -> Option<f64> {
    let len = values.len();
    if len == 0 {
        return None;
    }
    let q = span.max(1).min(len);

    let centre = x.round().clamp(0.0, (len - 1) as f64) as usize;
    let left = centre.saturating_sub(q / 2).min(len - q);
    let right = left + q - 1;

    let mut h = (x - left as f64).abs().max((right as f64 - x).abs());
    if span > len {
        h += ((span - len) / 2) as f64;
    }
    h = h.max(0.5);

    let mut w = Vec::with_capacity(q);
    let mut total = 0.0;
    for j in left..=right {
        let u = (j as f64 - x).abs() / h;
        let tricube = if u < 1.0 { (1.0 - u.powi(3)).powi(3) } else { 0.0 };
        let wj = tricube * weights[j];
        total += wj;
        w.push(wj);
    }
    if !(total > 0.0) {
        return None;
    }

    let x_bar: f64 = (left..=right).zip(&w).map(|(j, wj)| wj * j as f64).sum::<f64>() / total;
    let y_bar: f64 = (left..=right).zip(&w).map(|(j, wj)| wj * values[j]).sum::<f64>() / total;
    let sxx: f64 = (left..=right)
        .zip(&w)
        .map(|(j, wj)| wj * (j as f64 - x_bar).powi(2))
        .sum();
    let slope = if sxx > 1e-12 * h * h {
        (left..=right)
            .zip(&w)
            .map(|(j, wj)| wj * (j as f64 - x_bar) * (values[j] - y_bar))
            .sum::<f64>()
            / sxx
    } else {
        0.0
    };

    Some(y_bar + slope * (x - x_bar))
}

/// Bisquare weights with scale `6 * median(|r|)`.
fn robustness_weights(remainder: &[f64]) -> Vec<f64> {
    let abs: Vec<f64> = remainder.iter().map(|r| r.abs()).collect();
    let h = 6.0 * median(&abs);
    abs.iter()
        .map(|r| {
            if !(h > 1e-10) {
                return 1.0;
            }
            let u = r / h;
            if u < 1.0 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}
