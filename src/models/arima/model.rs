//! Seasonal ARIMA model estimated by conditional sum of squares.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{apply_polynomial, differencing_polynomial, integrate, poly_mul};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::normal_critical_value;

const COEFFICIENT_BOUNDS: (f64, f64) = (-0.99, 0.99);

/// SARIMA order `(p, d, q)(P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SarimaOrder {
    /// Non-seasonal AR order.
    pub p: usize,
    /// Non-seasonal differencing order.
    pub d: usize,
    /// Non-seasonal MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub cap_p: usize,
    /// Seasonal differencing order.
    pub cap_d: usize,
    /// Seasonal MA order.
    pub cap_q: usize,
    /// Seasonal period.
    pub s: usize,
}

impl SarimaOrder {
    pub fn new(p: usize, d: usize, q: usize, cap_p: usize, cap_d: usize, cap_q: usize, s: usize) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
            s,
        }
    }

    /// Non-seasonal ARIMA(p, d, q).
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new(p, d, q, 0, 0, 0, 0)
    }

    /// Check if this order has a seasonal component.
    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// A constant is estimated only for undifferenced models.
    pub fn has_mean(&self) -> bool {
        self.d + self.cap_d == 0
    }

    /// Number of estimated ARMA coefficients plus the mean.
    pub fn num_coefficients(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q + usize::from(self.has_mean())
    }

    /// Observations consumed by differencing.
    pub fn differencing_loss(&self) -> usize {
        self.d + self.s * self.cap_d
    }

    /// First index of the differenced series with a full AR history.
    fn css_start(&self) -> usize {
        self.p + self.s * self.cap_p
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{})({},{},{},{})",
            self.p, self.d, self.q, self.cap_p, self.cap_d, self.cap_q, self.s
        )
    }
}

/// Estimated SARIMA coefficients.
#[derive(Debug, Clone, Default, PartialEq)]
struct Coefficients {
    mean: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Layout `[mean?, ar.., ma.., sar.., sma..]`.
    fn from_vector(x: &[f64], order: &SarimaOrder) -> Self {
        let mut offset = 0;
        let mut take = |len: usize| {
            let part = x[offset..offset + len].to_vec();
            offset += len;
            part
        };
        let mean = if order.has_mean() { take(1)[0] } else { 0.0 };
        Self {
            mean,
            ar: take(order.p),
            ma: take(order.q),
            seasonal_ar: take(order.cap_p),
            seasonal_ma: take(order.cap_q),
        }
    }

    /// `φ(B)Φ(B^s)` as lag polynomial coefficients.
    fn ar_polynomial(&self, s: usize) -> Vec<f64> {
        let phi = lag_polynomial(&self.ar, 1, -1.0);
        let seasonal = lag_polynomial(&self.seasonal_ar, s, -1.0);
        poly_mul(&phi, &seasonal)
    }

    /// Expanded AR lags in `w_t = Σ a_k w_{t-k}` form (index 0 unused).
    fn expanded_ar(&self, s: usize) -> Vec<f64> {
        self.ar_polynomial(s).iter().map(|c| -c).collect()
    }

    /// Expanded MA lags of `θ(B)Θ(B^s)` (index 0 unused).
    fn expanded_ma(&self, s: usize) -> Vec<f64> {
        let theta = lag_polynomial(&self.ma, 1, 1.0);
        let seasonal = lag_polynomial(&self.seasonal_ma, s, 1.0);
        poly_mul(&theta, &seasonal)
    }
}

/// `1 + sign * Σ c_i B^(i*step)`.
fn lag_polynomial(coefs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let step = step.max(1);
    let mut poly = vec![0.0; coefs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// One-step residuals of the ARMA recursion on the differenced series.
///
/// Residuals before `start` are zero.
fn css_residuals(w: &[f64], ar: &[f64], ma: &[f64], mean: f64, start: usize) -> Vec<f64> {
    let mut residuals = vec![0.0; w.len()];
    for t in start..w.len() {
        let mut pred = mean;
        for (k, a) in ar.iter().enumerate().skip(1) {
            if t >= k {
                pred += a * (w[t - k] - mean);
            }
        }
        for (k, b) in ma.iter().enumerate().skip(1) {
            if t >= k {
                pred += b * residuals[t - k];
            }
        }
        residuals[t] = w[t] - pred;
    }
    residuals
}

/// Seasonal ARIMA forecaster.
///
/// The series is differenced by `(1 - B)^d (1 - B^s)^D`, then the
/// multiplicative ARMA `φ(B)Φ(B^s)(w_t - μ) = θ(B)Θ(B^s)e_t` is fitted by
/// minimising the conditional sum of squares with bounded Nelder-Mead.
/// Forecasts are integrated back through the differencing polynomial and
/// intervals use the psi-weights of the full model.
#[derive(Debug, Clone)]
pub struct Sarima {
    order: SarimaOrder,
    max_iterations: usize,
    coefficients: Option<Coefficients>,
    history: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    innovations: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    aic: Option<f64>,
}

impl Sarima {
    /// Create a new SARIMA model for the given order.
    pub fn new(order: SarimaOrder) -> Self {
        Self {
            order,
            max_iterations: 1000,
            coefficients: None,
            history: None,
            differenced: None,
            innovations: None,
            fitted: None,
            residuals: None,
            sigma2: None,
            aic: None,
        }
    }

    /// Cap on optimizer iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Innovation variance estimate.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        self.coefficients.as_ref().map(|c| c.ar.as_slice()).unwrap_or(&[])
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        self.coefficients.as_ref().map(|c| c.ma.as_slice()).unwrap_or(&[])
    }

    pub fn mean(&self) -> Option<f64> {
        self.coefficients.as_ref().map(|c| c.mean)
    }

    fn estimate(&self, w: &[f64]) -> Result<Coefficients> {
        let order = &self.order;
        let start = order.css_start();
        let n_coef = order.num_coefficients();
        let w_mean = w.iter().sum::<f64>() / w.len() as f64;

        if order.p + order.q + order.cap_p + order.cap_q == 0 {
            return Ok(Coefficients {
                mean: if order.has_mean() { w_mean } else { 0.0 },
                ..Default::default()
            });
        }

        let mut initial = Vec::with_capacity(n_coef);
        let mut bounds = Vec::with_capacity(n_coef);
        if order.has_mean() {
            initial.push(w_mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for len in [order.p, order.q, order.cap_p, order.cap_q] {
            for i in 0..len {
                initial.push(0.1 / (i + 1) as f64);
                bounds.push(COEFFICIENT_BOUNDS);
            }
        }

        let s = order.s;
        let objective = |x: &[f64]| {
            let c = Coefficients::from_vector(x, order);
            css_residuals(w, &c.expanded_ar(s), &c.expanded_ma(s), c.mean, start)[start..]
                .iter()
                .map(|e| e * e)
                .sum::<f64>()
        };

        let config = NelderMeadConfig::default().with_max_iter(self.max_iterations);
        let result = nelder_mead(objective, &initial, Some(&bounds), &config);
        if !result.converged {
            return Err(ForecastError::ComputationError(
                "solver did not converge".to_string(),
            ));
        }
        Ok(Coefficients::from_vector(&result.optimal_point, order))
    }

    /// Psi-weights `ψ_0..ψ_{h-1}` of the integrated model.
    fn psi_weights(&self, coefficients: &Coefficients, horizon: usize) -> Vec<f64> {
        let s = self.order.s;
        let diff = differencing_polynomial(self.order.d, self.order.cap_d, s);
        let full_ar = poly_mul(&coefficients.ar_polynomial(s), &diff);
        let ma = coefficients.expanded_ma(s);

        let mut psi = Vec::with_capacity(horizon);
        for j in 0..horizon {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = ma.get(j).copied().unwrap_or(0.0);
            for k in 1..=j {
                if let Some(&a) = full_ar.get(k) {
                    value -= a * psi[j - k];
                }
            }
            psi.push(value);
        }
        psi
    }
}

impl Default for Sarima {
    fn default() -> Self {
        Self::new(SarimaOrder::arima(1, 1, 1))
    }
}

impl Forecaster for Sarima {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let order = self.order;
        let poly = differencing_polynomial(order.d, order.cap_d, order.s);

        let start = order.css_start();
        // Residuals after the AR warm-up must outnumber the estimated
        // coefficients plus the variance.
        let needed = order.differencing_loss() + start + order.num_coefficients() + 2;
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let w = apply_polynomial(values, &poly);
        let coefficients = self.estimate(&w)?;
        let innovations = css_residuals(
            &w,
            &coefficients.expanded_ar(order.s),
            &coefficients.expanded_ma(order.s),
            coefficients.mean,
            start,
        );

        let n_eff = (w.len() - start) as f64;
        let css: f64 = innovations[start..].iter().map(|e| e * e).sum();
        let sigma2 = css / n_eff;
        let k = (order.num_coefficients() + 1) as f64;
        let log_likelihood = -0.5 * n_eff * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        let aic = -2.0 * log_likelihood + 2.0 * k;
        if !aic.is_finite() {
            return Err(ForecastError::ComputationError("non-finite AIC".to_string()));
        }

        // Map innovations back onto the original index.
        let lag = poly.len() - 1;
        let mut fitted = vec![f64::NAN; values.len()];
        let mut residuals = vec![f64::NAN; values.len()];
        for t in start..w.len() {
            residuals[t + lag] = innovations[t];
            fitted[t + lag] = values[t + lag] - innovations[t];
        }

        self.aic = Some(aic);
        self.sigma2 = Some(sigma2);
        self.history = Some(values.to_vec());
        self.differenced = Some(w);
        self.innovations = Some(innovations);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let coefficients = self.coefficients.as_ref().ok_or(ForecastError::FitRequired)?;
        let history = self.history.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let innovations = self.innovations.as_ref().ok_or(ForecastError::FitRequired)?;

        let s = self.order.s;
        let ar = coefficients.expanded_ar(s);
        let ma = coefficients.expanded_ma(s);
        let mean = coefficients.mean;

        let mut extended_w = w.clone();
        let mut extended_e = innovations.clone();
        for _ in 0..horizon {
            let t = extended_w.len();
            let mut pred = mean;
            for (k, a) in ar.iter().enumerate().skip(1) {
                if t >= k {
                    pred += a * (extended_w[t - k] - mean);
                }
            }
            for (k, b) in ma.iter().enumerate().skip(1) {
                if t >= k {
                    pred += b * extended_e[t - k];
                }
            }
            extended_w.push(pred);
            // Future innovations are zero.
            extended_e.push(0.0);
        }

        let poly = differencing_polynomial(self.order.d, self.order.cap_d, s);
        let predictions = integrate(&extended_w[w.len()..], history, &poly);
        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let forecast = self.predict(horizon)?;
        let coefficients = self.coefficients.as_ref().ok_or(ForecastError::FitRequired)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;

        let z = normal_critical_value(level);
        let psi = self.psi_weights(coefficients, horizon);

        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (point, weight) in forecast.values().iter().zip(&psi) {
            cumulative += weight * weight;
            let se = (sigma2 * cumulative).sqrt();
            lower.push(point - z * se);
            upper.push(point + z * se);
        }

        Forecast::from_values_with_intervals(forecast.into_values(), lower, upper)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SARIMA"
    }

    fn descriptor(&self) -> String {
        format!("SARIMA{}", self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use approx::assert_relative_eq;

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_values(Period::new(2000, 1).unwrap(), values).unwrap()
    }

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 10.0 + 0.5 * i as f64 + (i as f64 * 0.7).sin() + [1.0, -2.0, 0.5, 0.5][i % 4])
            .collect()
    }

    #[test]
    fn order_display_and_counts() {
        let order = SarimaOrder::new(1, 1, 0, 0, 1, 1, 4);
        assert_eq!(order.to_string(), "(1,1,0)(0,1,1,4)");
        assert!(order.is_seasonal());
        assert!(!order.has_mean());
        assert_eq!(order.num_coefficients(), 2);
        assert_eq!(order.differencing_loss(), 5);

        let stationary = SarimaOrder::arima(2, 0, 1);
        assert!(stationary.has_mean());
        assert_eq!(stationary.num_coefficients(), 4);
    }

    #[test]
    fn expanded_polynomials_multiply_seasonal_terms() {
        let c = Coefficients {
            mean: 0.0,
            ar: vec![0.5],
            ma: vec![0.2],
            seasonal_ar: vec![0.3],
            seasonal_ma: vec![0.4],
        };
        // (1 - 0.5B)(1 - 0.3B^4) = 1 - 0.5B - 0.3B^4 + 0.15B^5
        let ar = c.expanded_ar(4);
        assert_relative_eq!(ar[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(ar[4], 0.3, epsilon = 1e-12);
        assert_relative_eq!(ar[5], -0.15, epsilon = 1e-12);
        // (1 + 0.2B)(1 + 0.4B^4)
        let ma = c.expanded_ma(4);
        assert_relative_eq!(ma[5], 0.08, epsilon = 1e-12);
    }

    #[test]
    fn white_noise_model_forecasts_mean() {
        let values: Vec<f64> = (0..12).map(|i| if i % 2 == 0 { 9.0 } else { 11.0 }).collect();
        let mut model = Sarima::new(SarimaOrder::arima(0, 0, 0));
        model.fit(&series(values)).unwrap();

        assert_relative_eq!(model.mean().unwrap(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(model.sigma2().unwrap(), 1.0, epsilon = 1e-12);
        for v in model.predict(3).unwrap().values() {
            assert_relative_eq!(*v, 10.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn random_walk_forecast_repeats_last_value() {
        let values = vec![3.0, 5.0, 4.0, 6.0, 8.0, 7.0, 9.0, 8.0];
        let mut model = Sarima::new(SarimaOrder::arima(0, 1, 0));
        model.fit(&series(values)).unwrap();

        let forecast = model.predict_with_intervals(3, 0.95).unwrap();
        for v in forecast.values() {
            assert_relative_eq!(*v, 8.0, epsilon = 1e-12);
        }
        // Psi-weights of a random walk are all one, so widths grow like sqrt(h).
        let (lo1, hi1) = forecast.intervals().unwrap()[0];
        let (lo3, hi3) = forecast.intervals().unwrap()[2];
        assert_relative_eq!((hi3 - lo3) / (hi1 - lo1), 3f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn seasonal_difference_model_repeats_last_cycle() {
        let values = vec![10.0, 20.0, 30.0, 40.0, 11.0, 21.0, 31.0, 41.0, 10.0, 22.0, 30.0, 42.0];
        let mut model = Sarima::new(SarimaOrder::new(0, 0, 0, 0, 1, 0, 4));
        model.fit(&series(values)).unwrap();
        assert_eq!(model.predict(4).unwrap().values(), &[10.0, 22.0, 30.0, 42.0]);
    }

    #[test]
    fn arma_fit_reports_information_criteria() {
        let mut model = Sarima::new(SarimaOrder::arima(1, 1, 1));
        model.fit(&series(wavy(40))).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);
        assert!(model.aic().unwrap().is_finite());

        let forecast = model.predict_with_intervals(4, 0.95).unwrap();
        assert_eq!(forecast.horizon(), 4);
        for (lo, hi) in forecast.intervals().unwrap() {
            assert!(lo.is_finite() && hi.is_finite() && hi > lo);
        }
    }

    #[test]
    fn css_matches_least_squares_for_single_ar_term() {
        // Differenced series follows w_t = 0.5 w_{t-1} + e_t.
        let mut w = vec![1.0];
        for t in 1..40 {
            let e = ((t * 7919) % 13) as f64 - 6.0;
            w.push(0.5 * w[t - 1] + e);
        }
        let mut values = vec![100.0];
        for dw in &w {
            values.push(values[values.len() - 1] + dw);
        }

        let num: f64 = (1..w.len()).map(|t| w[t] * w[t - 1]).sum();
        let den: f64 = (1..w.len()).map(|t| w[t - 1] * w[t - 1]).sum();
        let least_squares = num / den;
        assert!(least_squares.abs() < 0.9);

        let mut model = Sarima::new(SarimaOrder::arima(1, 1, 0));
        model.fit(&series(values)).unwrap();
        assert_relative_eq!(model.ar_coefficients()[0], least_squares, epsilon = 1e-4);
    }

    #[test]
    fn fitted_values_align_with_original_index() {
        let mut model = Sarima::new(SarimaOrder::arima(1, 1, 0));
        let values = wavy(20);
        model.fit(&series(values.clone())).unwrap();

        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();
        assert_eq!(fitted.len(), 20);
        assert!(fitted[0].is_nan() && fitted[1].is_nan());
        for t in 2..20 {
            assert_relative_eq!(fitted[t] + residuals[t], values[t], epsilon = 1e-9);
        }
    }

    #[test]
    fn short_series_is_rejected() {
        let mut model = Sarima::new(SarimaOrder::new(2, 1, 2, 1, 1, 1, 4));
        assert!(matches!(
            model.fit(&series(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn perfect_fit_has_non_finite_aic() {
        let mut model = Sarima::new(SarimaOrder::arima(0, 1, 0));
        let err = model.fit(&series(vec![50.0; 10])).unwrap_err();
        assert_eq!(err, ForecastError::ComputationError("non-finite AIC".to_string()));
    }

    #[test]
    fn requires_fit() {
        let model = Sarima::default();
        assert!(matches!(model.predict(2), Err(ForecastError::FitRequired)));
        assert_eq!(model.descriptor(), "SARIMA(1,1,1)(0,0,0,0)");
    }
}
