//! The end-to-end forecasting pipeline.
//!
//! A run cross-validates every candidate family over rolling origins, ranks
//! the families by mean sMAPE (MASE breaks ties), refits the winner on the
//! whole series and optionally writes the diagnostics artifacts.
//!
//! # Example
//!
//! ```
//! use quarterly_forecast::core::{Period, TimeSeries};
//! use quarterly_forecast::pipeline::{run_pipeline, PipelineConfig, PipelineStage};
//! use quarterly_forecast::models::arima::SarimaSearch;
//!
//! let values = vec![
//!     100.0, 110.0, 90.0, 120.0, 105.0, 115.0, 95.0, 125.0, 110.0, 120.0, 100.0, 130.0,
//! ];
//! let series = TimeSeries::from_values(Period::new(2020, 1).unwrap(), values).unwrap();
//! let config = PipelineConfig::default()
//!     .with_horizon(1)
//!     .with_sarima(SarimaSearch::default().with_max_orders(1, 1));
//!
//! let run = run_pipeline(&series, &config).unwrap();
//! assert_eq!(run.stage, PipelineStage::FinalFitted);
//! assert_eq!(run.cross_validation.n_folds, 4);
//! assert_eq!(run.forecast.periods[0], Period::new(2023, 1).unwrap());
//! ```

mod config;
mod final_fit;
mod state;

pub use config::PipelineConfig;
pub use final_fit::{FinalFitter, ForecastResult};
pub use state::{PipelineStage, StageTracker};

use tracing::{info, warn};

use crate::core::{Period, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::evaluation::{aggregate, select, AggregateScore, CrossValidation, Selection};
use crate::io::{DiagnosticsReporter, ReportSink};
use crate::models::ModelKind;

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// `FinalFitted`, or `Reported` once diagnostics were written.
    pub stage: PipelineStage,
    pub observations: usize,
    pub first_period: Period,
    pub last_period: Period,
    pub cross_validation: CrossValidation,
    pub scores: Vec<AggregateScore>,
    pub selection: Selection,
    pub forecast: ForecastResult,
}

/// A configured pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Fails when the configuration does not validate.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Rolling-origin evaluation of every family.
    ///
    /// When `min_train` leaves no fold, retries once with
    /// `fallback_min_train`.
    pub fn cross_validate(&self, series: &TimeSeries) -> Result<CrossValidation> {
        let settings = self.config.candidate_settings();
        let primary = self.config.rolling_origin(self.config.min_train);
        match primary.evaluate(series, &ModelKind::ALL, &settings) {
            Err(ForecastError::InsufficientData { .. }) => {
                let min_train = self.config.fallback_min_train;
                warn!(
                    observations = series.len(),
                    min_train = self.config.min_train,
                    retry_min_train = min_train,
                    "no cross-validation fold; retrying with a smaller training window"
                );
                self.config
                    .rolling_origin(min_train)
                    .evaluate(series, &ModelKind::ALL, &settings)
            }
            other => other,
        }
    }

    /// Aggregated and detailed scores without selection or refit.
    pub fn evaluate(&self, series: &TimeSeries) -> Result<(Vec<AggregateScore>, CrossValidation)> {
        let cv = self.cross_validate(series)?;
        Ok((aggregate(&cv.records), cv))
    }

    /// Run up to the final fit.
    pub fn run(&self, series: &TimeSeries) -> Result<PipelineRun> {
        let mut tracker = StageTracker::loaded();
        self.run_tracked(series, &mut tracker)
    }

    /// Run the whole pipeline and write the diagnostics to `sink`.
    pub fn run_and_report(
        &self,
        series: &TimeSeries,
        reporter: &DiagnosticsReporter,
        sink: &mut dyn ReportSink,
    ) -> Result<PipelineRun> {
        let mut tracker = StageTracker::loaded();
        let mut run = self.run_tracked(series, &mut tracker)?;
        reporter
            .report(&run, sink)
            .map_err(|e| tracker.fail(format!("writing diagnostics: {e}")))?;
        tracker.advance(PipelineStage::Reported)?;
        run.stage = tracker.current();
        Ok(run)
    }

    fn run_tracked(&self, series: &TimeSeries, tracker: &mut StageTracker) -> Result<PipelineRun> {
        let (first_period, last_period) = match (series.first_period(), series.last_period()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(tracker.fail(ForecastError::EmptyData)),
        };
        if series.len() < self.config.min_recommended_observations {
            warn!(
                observations = series.len(),
                recommended = self.config.min_recommended_observations,
                "short series; results may be unreliable"
            );
        }

        let cv = self.cross_validate(series).map_err(|e| tracker.fail(e))?;
        tracker.advance(PipelineStage::CrossValidated)?;

        let scores = aggregate(&cv.records);
        let selection = select(&scores).map_err(|e| tracker.fail(e))?;
        let best = selection.best();
        info!(
            model = %selection.selected,
            mean_smape = best.mean_smape,
            mean_mase = best.mean_mase,
            "model selected"
        );
        tracker.advance(PipelineStage::Selected)?;

        let fitter = FinalFitter::new(self.config.candidate_settings(), self.config.confidence_level);
        let forecast = fitter
            .fit(selection.selected, series, self.config.horizon)
            .map_err(|e| tracker.fail(e))?;
        tracker.advance(PipelineStage::FinalFitted)?;

        Ok(PipelineRun {
            stage: tracker.current(),
            observations: series.len(),
            first_period,
            last_period,
            cross_validation: cv,
            scores,
            selection,
            forecast,
        })
    }
}

/// Validate `config` and run the pipeline on `series` up to the final fit.
pub fn run_pipeline(series: &TimeSeries, config: &PipelineConfig) -> Result<PipelineRun> {
    Pipeline::new(config.clone())?.run(series)
}

/// Aggregated and per-fold scores, for inspecting the evaluation alone.
pub fn evaluate_models(
    series: &TimeSeries,
    config: &PipelineConfig,
) -> Result<(Vec<AggregateScore>, CrossValidation)> {
    Pipeline::new(config.clone())?.evaluate(series)
}
