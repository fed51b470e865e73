//! Exhaustive SARIMA order search by AIC.
//!
//! Every order of the grid is fitted independently. Orders that fail
//! (too little data, optimizer non-convergence, non-finite AIC) are kept as
//! [`GridFailure`]s; the winner is the minimum-AIC success, and on an exact
//! AIC tie the order visited first wins. The visiting order is fixed:
//! `p`, then `d`, then `q`, then `P`, `D`, `Q`, each ascending over its
//! candidate set.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::model::{Sarima, SarimaOrder};
use crate::models::Forecaster;
use crate::utils::parallel::ordered_map;

/// Bounds of the SARIMA order search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarimaSearch {
    /// Largest non-seasonal AR order; `p` ranges over `0..=max_p`.
    pub max_p: usize,
    /// Largest non-seasonal MA order; `q` ranges over `0..=max_q`.
    pub max_q: usize,
    /// Non-seasonal differencing candidates.
    pub d_values: Vec<usize>,
    /// Seasonal AR candidates.
    pub seasonal_p_values: Vec<usize>,
    /// Seasonal differencing candidates.
    pub seasonal_d_values: Vec<usize>,
    /// Seasonal MA candidates.
    pub seasonal_q_values: Vec<usize>,
    /// Optimizer iteration cap per fit.
    pub max_iterations: usize,
}

impl Default for SarimaSearch {
    fn default() -> Self {
        Self {
            max_p: 2,
            max_q: 2,
            d_values: vec![0, 1],
            seasonal_p_values: vec![0, 1],
            seasonal_d_values: vec![0, 1],
            seasonal_q_values: vec![0, 1],
            max_iterations: 1000,
        }
    }
}

impl SarimaSearch {
    /// The same non-seasonal bounds with `P = D = Q = 0`.
    pub fn non_seasonal(&self) -> Self {
        Self {
            seasonal_p_values: vec![0],
            seasonal_d_values: vec![0],
            seasonal_q_values: vec![0],
            ..self.clone()
        }
    }

    pub fn with_max_orders(mut self, max_p: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_q = max_q;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// All orders of the grid in visiting order.
    pub fn orders(&self, period: usize) -> Vec<SarimaOrder> {
        let mut orders = Vec::new();
        for p in 0..=self.max_p {
            for &d in &self.d_values {
                for q in 0..=self.max_q {
                    for &cap_p in &self.seasonal_p_values {
                        for &cap_d in &self.seasonal_d_values {
                            for &cap_q in &self.seasonal_q_values {
                                orders.push(SarimaOrder::new(p, d, q, cap_p, cap_d, cap_q, period));
                            }
                        }
                    }
                }
            }
        }
        orders
    }

    /// Check that every candidate set is non-empty.
    pub fn validate(&self) -> Result<()> {
        let sets = [
            ("d_values", &self.d_values),
            ("seasonal_p_values", &self.seasonal_p_values),
            ("seasonal_d_values", &self.seasonal_d_values),
            ("seasonal_q_values", &self.seasonal_q_values),
        ];
        for (name, set) in sets {
            if set.is_empty() {
                return Err(ForecastError::InvalidParameter(format!(
                    "SARIMA search set {name} must not be empty"
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "SARIMA max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A grid cell that produced no usable fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridFailure {
    pub order: SarimaOrder,
    pub reason: String,
}

/// SARIMA with its order chosen by exhaustive AIC search.
#[derive(Debug, Clone)]
pub struct SarimaGrid {
    search: SarimaSearch,
    period: usize,
    selected: Option<Sarima>,
    failures: Vec<GridFailure>,
    evaluated: usize,
}

impl SarimaGrid {
    pub fn new(search: SarimaSearch, period: usize) -> Self {
        Self {
            search,
            period,
            selected: None,
            failures: Vec::new(),
            evaluated: 0,
        }
    }

    /// Best order found by the last fit.
    pub fn selected_order(&self) -> Option<SarimaOrder> {
        self.selected.as_ref().map(Sarima::order)
    }

    /// AIC of the selected model.
    pub fn selected_aic(&self) -> Option<f64> {
        self.selected.as_ref().and_then(Sarima::aic)
    }

    /// Orders that failed during the last fit, in grid order.
    pub fn failures(&self) -> &[GridFailure] {
        &self.failures
    }

    /// Take ownership of the recorded failures.
    pub fn take_failures(&mut self) -> Vec<GridFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Number of orders tried by the last fit.
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    fn fit_order(&self, series: &TimeSeries, order: SarimaOrder) -> Result<Sarima> {
        let mut model = Sarima::new(order).with_max_iterations(self.search.max_iterations);
        model.fit(series)?;
        match model.aic() {
            Some(aic) if aic.is_finite() => Ok(model),
            _ => Err(ForecastError::ComputationError("non-finite AIC".to_string())),
        }
    }
}

impl Forecaster for SarimaGrid {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let orders = self.search.orders(self.period);
        let outcomes = ordered_map(&orders, |&order| (order, self.fit_order(series, order)));

        let mut failures = Vec::new();
        let mut fitted = Vec::new();
        for (order, outcome) in outcomes {
            match outcome {
                Ok(model) => fitted.push(model),
                Err(e) => failures.push(GridFailure {
                    order,
                    reason: e.to_string(),
                }),
            }
        }

        // `min_by` keeps the first of equal elements.
        let best = fitted
            .into_iter()
            .min_by(|a, b| {
                let a = a.aic().unwrap_or(f64::INFINITY);
                let b = b.aic().unwrap_or(f64::INFINITY);
                a.total_cmp(&b)
            });

        debug!(
            evaluated = orders.len(),
            failed = failures.len(),
            selected = ?best.as_ref().map(|m| m.order().to_string()),
            "SARIMA grid search finished"
        );

        self.evaluated = orders.len();
        self.failures = failures;
        match best {
            Some(model) => {
                self.selected = Some(model);
                Ok(())
            }
            None => {
                self.selected = None;
                Err(ForecastError::ComputationError(format!(
                    "no SARIMA order converged ({} of {} failed)",
                    self.failures.len(),
                    self.evaluated
                )))
            }
        }
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref().and_then(|m| m.fitted_values())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref().and_then(|m| m.residuals())
    }

    fn name(&self) -> &str {
        "SARIMA"
    }

    fn descriptor(&self) -> String {
        match &self.selected {
            Some(model) => model.descriptor(),
            None => "SARIMA(grid)".to_string(),
        }
    }
}
