//! Diagnostics artifacts of a pipeline run.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ForecastError, Result};
use crate::evaluation::{AggregateScore, ScoreRecord};
use crate::pipeline::{ForecastResult, PipelineRun};

pub const MODEL_COMPARISON: &str = "model_comparison.csv";
pub const CV_FOLDS_DETAILED: &str = "model_cv_folds_detailed.csv";
pub const FORECASTS_FULL_FIT: &str = "forecasts_full_fit.csv";
pub const DIAGNOSTICS_SUMMARY: &str = "model_diagnostics.txt";

/// Destination for named text artifacts.
pub trait ReportSink {
    fn write_artifact(&mut self, name: &str, contents: &str) -> Result<()>;
}

/// Writes each artifact as a file in one directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl FileSink {
    /// Creates `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            written: Vec::new(),
        })
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ReportSink for FileSink {
    fn write_artifact(&mut self, name: &str, contents: &str) -> Result<()> {
        let path = self.dir.join(name);
        fs::write(&path, contents)?;
        info!(path = %path.display(), "wrote artifact");
        self.written.push(path);
        Ok(())
    }
}

/// Sends artifacts to the log instead of the file system.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn write_artifact(&mut self, name: &str, contents: &str) -> Result<()> {
        info!(artifact = name, lines = contents.lines().count(), "diagnostics artifact");
        for line in contents.lines() {
            debug!(artifact = name, "{line}");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ComparisonRow<'a> {
    rank: Option<usize>,
    model: &'a str,
    mean_smape: Option<f64>,
    mean_mase: Option<f64>,
    folds: usize,
    fallbacks: usize,
}

#[derive(Serialize)]
struct FoldRow<'a> {
    fold_end_index: usize,
    fold_train_end: String,
    fold_test_start: String,
    model: &'a str,
    smape: Option<f64>,
    mase: Option<f64>,
    fallback: bool,
    fallback_reason: &'a str,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ForecastError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ForecastError::Csv(e.to_string()))
}

/// Ranked models first, then the excluded ones without a rank.
pub fn comparison_csv(ranking: &[AggregateScore], excluded: &[AggregateScore]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let ranked = ranking.iter().enumerate().map(|(i, s)| (Some(i + 1), s));
    let unranked = excluded.iter().map(|s| (None, s));
    for (rank, score) in ranked.chain(unranked) {
        writer.serialize(ComparisonRow {
            rank,
            model: score.model.as_str(),
            mean_smape: finite(score.mean_smape),
            mean_mase: finite(score.mean_mase),
            folds: score.folds,
            fallbacks: score.fallbacks,
        })?;
    }
    into_string(writer)
}

/// One row per fold and model; undefined metrics are left empty.
pub fn folds_csv(records: &[ScoreRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(FoldRow {
            fold_end_index: record.fold_end_index,
            fold_train_end: record.train_end.to_string(),
            fold_test_start: record.test_start.to_string(),
            model: record.model.as_str(),
            smape: finite(record.smape),
            mase: finite(record.mase),
            fallback: record.is_fallback(),
            fallback_reason: record.fallback.as_deref().unwrap_or(""),
        })?;
    }
    into_string(writer)
}

/// Future periods with point forecasts and, for SARIMA, bounds.
pub fn forecast_csv(forecast: &ForecastResult) -> Result<String> {
    let pct = (forecast.confidence_level * 100.0).round();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "period".to_string(),
        "quarter_start".to_string(),
        "model".to_string(),
        "forecast".to_string(),
        format!("lower_{pct}"),
        format!("upper_{pct}"),
    ])?;
    for (i, (period, point)) in forecast.periods.iter().zip(&forecast.point).enumerate() {
        let (lower, upper) = match forecast.interval(i) {
            Some((lo, hi)) => (lo.to_string(), hi.to_string()),
            None => (String::new(), String::new()),
        };
        let start = period
            .start_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        writer.write_record([
            period.label(),
            start,
            forecast.model.as_str().to_string(),
            point.to_string(),
            lower,
            upper,
        ])?;
    }
    into_string(writer)
}

fn fmt_metric(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        "n/a".to_string()
    }
}

/// Writes the four diagnostics artifacts of a run.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsReporter {
    input: Option<PathBuf>,
    timestamp: Option<DateTime<Utc>>,
}

impl DiagnosticsReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input file named in the summary.
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Fixed timestamp instead of the current time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Free-text summary of the run.
    pub fn summary(&self, run: &PipelineRun) -> String {
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let forecast = &run.forecast;
        let mut out = String::new();

        let _ = writeln!(out, "Quarterly forecast diagnostics");
        let _ = writeln!(out, "Generated: {}", timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        if let Some(input) = &self.input {
            let _ = writeln!(out, "Input: {}", input.display());
        }
        let _ = writeln!(
            out,
            "Series: {} observations, {} to {}",
            run.observations,
            run.first_period.label(),
            run.last_period.label()
        );
        let cv = &run.cross_validation;
        let _ = writeln!(
            out,
            "Cross-validation: {} folds, min_train={}, horizon={}",
            cv.n_folds, cv.min_train, cv.horizon
        );

        let _ = writeln!(out);
        let _ = writeln!(out, "Ranking (mean sMAPE, mean MASE):");
        for (i, score) in run.selection.ranking.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {:<15} {}  {}  fallbacks={}/{}",
                i + 1,
                score.model.as_str(),
                fmt_metric(score.mean_smape),
                fmt_metric(score.mean_mase),
                score.fallbacks,
                score.folds
            );
        }
        for score in &run.selection.excluded {
            let _ = writeln!(out, "  -  {:<15} excluded (no valid sMAPE)", score.model.as_str());
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Selected model: {}", run.selection.selected);
        let _ = writeln!(out, "Final fit: {}", forecast.descriptor);
        if let Some(reason) = &forecast.fallback {
            let _ = writeln!(out, "Final fit fallback: {reason}");
        }
        let _ = writeln!(out, "Horizon: {}", forecast.horizon());
        for (i, (period, point)) in forecast.periods.iter().zip(&forecast.point).enumerate() {
            match forecast.interval(i) {
                Some((lo, hi)) => {
                    let _ = writeln!(
                        out,
                        "  {}: {:.4} [{:.4}, {:.4}]",
                        period.label(),
                        point,
                        lo,
                        hi
                    );
                }
                None => {
                    let _ = writeln!(out, "  {}: {:.4}", period.label(), point);
                }
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Failed SARIMA grid cells: {} during cross-validation, {} in the final fit",
            cv.grid_failures.len(),
            forecast.grid_failures.len()
        );
        for failed in &forecast.grid_failures {
            let _ = writeln!(out, "  final {}: {}", failed.order, failed.reason);
        }
        for failed in &cv.grid_failures {
            let _ = writeln!(
                out,
                "  fold {} {} {}: {}",
                failed.fold_end_index,
                failed.model.as_str(),
                failed.failure.order,
                failed.failure.reason
            );
        }
        out
    }

    /// Write all artifacts to `sink`.
    pub fn report(&self, run: &PipelineRun, sink: &mut dyn ReportSink) -> Result<()> {
        sink.write_artifact(
            MODEL_COMPARISON,
            &comparison_csv(&run.selection.ranking, &run.selection.excluded)?,
        )?;
        sink.write_artifact(CV_FOLDS_DETAILED, &folds_csv(&run.cross_validation.records)?)?;
        sink.write_artifact(FORECASTS_FULL_FIT, &forecast_csv(&run.forecast)?)?;
        sink.write_artifact(DIAGNOSTICS_SUMMARY, &self.summary(run))?;
        Ok(())
    }
}
