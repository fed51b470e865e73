//! Additive Holt-Winters (ETS A,A,A) forecasting model.
//!
//! Triple exponential smoothing with additive trend and additive
//! seasonality. The smoothing weights and the initial level, trend and
//! seasonal states are estimated jointly by minimising the one-step-ahead
//! sum of squared errors.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

const WEIGHT_BOUNDS: (f64, f64) = (1e-4, 0.9999);
const STATE_BOUNDS: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);

/// Estimated smoothing weights and initial states.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltWintersParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub initial_level: f64,
    pub initial_trend: f64,
    /// One state per season position; sums to zero.
    pub initial_seasonals: Vec<f64>,
}

impl HoltWintersParams {
    /// Decode an optimizer vector `[α, β, γ, l0, b0, s_0 .. s_{m-2}]`.
    /// The last seasonal state is implied by the zero-sum constraint.
    fn from_vector(x: &[f64], period: usize) -> Self {
        let mut seasonals: Vec<f64> = x[5..5 + period - 1].to_vec();
        seasonals.push(-seasonals.iter().sum::<f64>());
        Self {
            alpha: x[0],
            beta: x[1],
            gamma: x[2],
            initial_level: x[3],
            initial_trend: x[4],
            initial_seasonals: seasonals,
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        let mut x = vec![
            self.alpha,
            self.beta,
            self.gamma,
            self.initial_level,
            self.initial_trend,
        ];
        let free = self.initial_seasonals.len().saturating_sub(1);
        x.extend_from_slice(&self.initial_seasonals[..free]);
        x
    }
}

/// Filtered states after running the recursions over a series.
struct Filtered {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
}

/// Additive Holt-Winters forecaster.
///
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
/// - Forecast: `ŷ_{t+h} = l_t + h*b_t + s_{t+h-m}`
#[derive(Debug, Clone)]
pub struct HoltWinters {
    seasonal_period: usize,
    max_iterations: usize,
    params: Option<HoltWintersParams>,
    level: Option<f64>,
    trend: Option<f64>,
    /// Seasonal states indexed by season position (`t % m`).
    seasonals: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sse: Option<f64>,
    n: usize,
}

impl HoltWinters {
    /// Create an additive model with estimated parameters.
    pub fn additive(seasonal_period: usize) -> Self {
        Self {
            seasonal_period: seasonal_period.max(2),
            max_iterations: 1000,
            params: None,
            level: None,
            trend: None,
            seasonals: None,
            fitted: None,
            residuals: None,
            sse: None,
            n: 0,
        }
    }

    /// Cap on optimizer iterations per restart.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Estimated parameters, once fitted.
    pub fn params(&self) -> Option<&HoltWintersParams> {
        self.params.as_ref()
    }

    /// In-sample sum of squared one-step errors.
    pub fn sse(&self) -> Option<f64> {
        self.sse
    }

    /// Heuristic starting point from the first two seasons.
    fn initial_guess(values: &[f64], period: usize) -> HoltWintersParams {
        let first_season = &values[..period];
        let level = first_season.iter().sum::<f64>() / period as f64;

        let trend = (0..period)
            .map(|i| (values[period + i] - values[i]) / period as f64)
            .sum::<f64>()
            / period as f64;

        let mut seasonals: Vec<f64> = first_season.iter().map(|y| y - level).collect();
        let mean = seasonals.iter().sum::<f64>() / period as f64;
        seasonals.iter_mut().for_each(|s| *s -= mean);

        HoltWintersParams {
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.1,
            initial_level: level,
            initial_trend: trend,
            initial_seasonals: seasonals,
        }
    }

    fn filter(values: &[f64], params: &HoltWintersParams) -> Filtered {
        let period = params.initial_seasonals.len();
        let mut level = params.initial_level;
        let mut trend = params.initial_trend;
        let mut seasonals = params.initial_seasonals.clone();
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate() {
            let idx = t % period;
            let s = seasonals[idx];
            let forecast = level + trend + s;
            fitted.push(forecast);
            sse += (y - forecast).powi(2);

            let level_prev = level;
            level = params.alpha * (y - s) + (1.0 - params.alpha) * (level_prev + trend);
            trend = params.beta * (level - level_prev) + (1.0 - params.beta) * trend;
            seasonals[idx] = params.gamma * (y - level) + (1.0 - params.gamma) * s;
        }

        Filtered {
            level,
            trend,
            seasonals,
            fitted,
            sse,
        }
    }

    fn estimate(&self, values: &[f64]) -> HoltWintersParams {
        let period = self.seasonal_period;
        let mut bounds = vec![WEIGHT_BOUNDS; 3];
        bounds.extend(std::iter::repeat(STATE_BOUNDS).take(2 + period - 1));

        let config = NelderMeadConfig::default().with_max_iter(self.max_iterations);
        let objective = |x: &[f64]| Self::filter(values, &HoltWintersParams::from_vector(x, period)).sse;

        let mut start = Self::initial_guess(values, period).to_vector();
        // Restart once from the first optimum.
        for _ in 0..2 {
            let result = nelder_mead(&objective, &start, Some(&bounds), &config);
            start = result.optimal_point;
        }
        HoltWintersParams::from_vector(&start, period)
    }
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self::additive(4)
    }
}

impl Forecaster for HoltWinters {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let period = self.seasonal_period;
        if values.len() < 2 * period {
            return Err(ForecastError::InsufficientData {
                needed: 2 * period,
                got: values.len(),
            });
        }

        let params = self.estimate(values);
        let filtered = Self::filter(values, &params);
        if !filtered.sse.is_finite() || !filtered.level.is_finite() || !filtered.trend.is_finite()
        {
            return Err(ForecastError::ComputationError(
                "exponential smoothing produced non-finite states".to_string(),
            ));
        }

        self.n = values.len();
        self.residuals = Some(
            values
                .iter()
                .zip(&filtered.fitted)
                .map(|(y, f)| y - f)
                .collect(),
        );
        self.level = Some(filtered.level);
        self.trend = Some(filtered.trend);
        self.seasonals = Some(filtered.seasonals);
        self.fitted = Some(filtered.fitted);
        self.sse = Some(filtered.sse);
        self.params = Some(params);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        let trend = self.trend.ok_or(ForecastError::FitRequired)?;
        let seasonals = self.seasonals.as_ref().ok_or(ForecastError::FitRequired)?;
        let period = seasonals.len();

        let predictions = (1..=horizon)
            .map(|h| level + h as f64 * trend + seasonals[(self.n + h - 1) % period])
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
        "ETS"
    }

    fn descriptor(&self) -> String {
        match &self.params {
            Some(p) => format!(
                "ETS(A,A,A,{}) alpha={:.3} beta={:.3} gamma={:.3}",
                self.seasonal_period, p.alpha, p.beta, p.gamma
            ),
            None => format!("ETS(A,A,A,{})", self.seasonal_period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use approx::assert_relative_eq;

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_values(Period::new(2018, 1).unwrap(), values).unwrap()
    }

    fn seasonal_trend(n: usize) -> Vec<f64> {
        let pattern = [5.0, -3.0, 8.0, -10.0];
        (0..n).map(|i| 100.0 + 2.0 * i as f64 + pattern[i % 4]).collect()
    }

    #[test]
    fn params_vector_enforces_zero_sum_seasonals() {
        let params = HoltWintersParams::from_vector(&[0.5, 0.1, 0.2, 10.0, 1.0, 2.0, -1.0, 3.0], 4);
        assert_eq!(params.initial_seasonals.len(), 4);
        assert_relative_eq!(params.initial_seasonals.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_eq!(params.to_vector().len(), 8);
    }

    #[test]
    fn holt_winters_tracks_seasonal_trend() {
        let values = seasonal_trend(20);
        let mut model = HoltWinters::additive(4);
        model.fit(&series(values)).unwrap();

        let forecast = model.predict(4).unwrap();
        let expected: Vec<f64> = seasonal_trend(24)[20..].to_vec();
        for (f, e) in forecast.values().iter().zip(&expected) {
            assert_relative_eq!(*f, *e, epsilon = 2.0);
        }
    }

    #[test]
    fn holt_winters_parameters_within_bounds() {
        let mut model = HoltWinters::additive(4);
        model.fit(&series(seasonal_trend(16))).unwrap();

        let p = model.params().unwrap();
        for w in [p.alpha, p.beta, p.gamma] {
            assert!((WEIGHT_BOUNDS.0..=WEIGHT_BOUNDS.1).contains(&w));
        }
        assert!(model.sse().unwrap().is_finite());
        assert_eq!(model.fitted_values().unwrap().len(), 16);
    }

    #[test]
    fn holt_winters_needs_two_seasons() {
        let mut model = HoltWinters::additive(4);
        assert!(matches!(
            model.fit(&series(vec![1.0; 7])),
            Err(ForecastError::InsufficientData { needed: 8, got: 7 })
        ));
        assert!(matches!(model.predict(1), Err(ForecastError::FitRequired)));
    }

    #[test]
    fn holt_winters_constant_series() {
        let mut model = HoltWinters::additive(4);
        model.fit(&series(vec![50.0; 10])).unwrap();
        for v in model.predict(2).unwrap().values() {
            assert_relative_eq!(*v, 50.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn holt_winters_name() {
        let model = HoltWinters::default();
        assert_eq!(model.name(), "ETS");
        assert_eq!(model.descriptor(), "ETS(A,A,A,4)");
    }
}
