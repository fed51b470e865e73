//! Rolling-origin cross-validation over the candidate models.

use serde::Serialize;
use tracing::debug;

use crate::core::{Period, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::GridFailure;
use crate::models::{attempt, CandidateSettings, ModelKind};
use crate::utils::metrics::{mase, smape};
use crate::utils::parallel::ordered_map;

/// Expanding-window split configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingOrigin {
    /// Test points per fold.
    pub horizon: usize,
    /// Training points in the first fold.
    pub min_train: usize,
}

impl RollingOrigin {
    pub fn new(min_train: usize, horizon: usize) -> Self {
        Self { horizon, min_train }
    }

    /// `n - min_train - horizon + 1` when positive, else zero.
    pub fn fold_count(&self, n: usize) -> usize {
        (n + 1).saturating_sub(self.min_train + self.horizon)
    }

    /// All folds of `series`, earliest cut first.
    ///
    /// Fails with [`ForecastError::InsufficientData`] when no fold fits.
    pub fn folds(&self, series: &TimeSeries) -> Result<Vec<Fold>> {
        let n = series.len();
        if self.horizon == 0 || self.min_train == 0 || self.fold_count(n) == 0 {
            return Err(ForecastError::InsufficientData {
                needed: self.min_train.max(1) + self.horizon.max(1),
                got: n,
            });
        }

        (self.min_train..=n - self.horizon)
            .map(|cut| {
                Ok(Fold {
                    cut,
                    train: series.slice(0, cut)?,
                    test: series.slice(cut, cut + self.horizon)?,
                })
            })
            .collect()
    }

    /// Score every model on every fold.
    ///
    /// Records come back fold by fold, and within a fold in the order of
    /// `models`. Model failures become flagged fallback forecasts.
    pub fn evaluate(
        &self,
        series: &TimeSeries,
        models: &[ModelKind],
        settings: &CandidateSettings,
    ) -> Result<CrossValidation> {
        let folds = self.folds(series)?;
        let jobs: Vec<(&Fold, ModelKind)> = folds
            .iter()
            .flat_map(|fold| models.iter().map(move |&kind| (fold, kind)))
            .collect();

        let outcomes = ordered_map(&jobs, |&(fold, kind)| {
            attempt(kind, &fold.train, self.horizon, None, settings).map(|fit| (fold, fit))
        });

        let mut records = Vec::with_capacity(jobs.len());
        let mut grid_failures = Vec::new();
        for outcome in outcomes {
            let (fold, fit) = outcome?;
            let actual = fold.test.values();
            let predicted = fit.forecast.values();
            grid_failures.extend(fit.grid_failures.into_iter().map(|failure| FoldGridFailure {
                fold_end_index: fold.cut,
                model: fit.kind,
                failure,
            }));
            records.push(ScoreRecord {
                fold_end_index: fold.cut,
                train_end: fold.train_end(),
                test_start: fold.test_start(),
                model: fit.kind,
                smape: smape(actual, predicted),
                mase: mase(fold.train.values(), actual, predicted),
                fallback: fit.fallback,
            });
        }

        debug!(
            folds = folds.len(),
            records = records.len(),
            grid_failures = grid_failures.len(),
            "rolling-origin evaluation finished"
        );

        Ok(CrossValidation {
            min_train: self.min_train,
            horizon: self.horizon,
            n_folds: folds.len(),
            records,
            grid_failures,
        })
    }
}

/// One train/test split: `train = series[..cut]`, `test = series[cut..cut + h]`.
#[derive(Debug, Clone)]
pub struct Fold {
    pub cut: usize,
    pub train: TimeSeries,
    pub test: TimeSeries,
}

impl Fold {
    /// Last training period.
    pub fn train_end(&self) -> Period {
        self.train.periods()[self.cut - 1]
    }

    /// First test period.
    pub fn test_start(&self) -> Period {
        self.test.periods()[0]
    }
}

/// Score of one model on one fold. NaN marks an undefined metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    /// Training length, i.e. index of the first test point.
    pub fold_end_index: usize,
    pub train_end: Period,
    pub test_start: Period,
    pub model: ModelKind,
    pub smape: f64,
    pub mase: f64,
    /// Failure text when the model fell back to repeating the last value.
    pub fallback: Option<String>,
}

impl ScoreRecord {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// A SARIMA grid cell that failed while fitting one fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldGridFailure {
    pub fold_end_index: usize,
    /// Family whose search hit the failure (SARIMA or STL+ARIMA).
    pub model: ModelKind,
    #[serde(flatten)]
    pub failure: GridFailure,
}

/// Detailed outcome of a cross-validation run.
#[derive(Debug, Clone)]
pub struct CrossValidation {
    /// Minimum training size actually used.
    pub min_train: usize,
    pub horizon: usize,
    pub n_folds: usize,
    pub records: Vec<ScoreRecord>,
    /// Failed SARIMA grid cells, fold by fold in grid order.
    pub grid_failures: Vec<FoldGridFailure>,
}
