//! Input loading and diagnostics output.

mod loader;
mod report;

pub use loader::{LoadReport, LoadedSeries, SeriesLoader};
pub use report::{
    comparison_csv, folds_csv, forecast_csv, DiagnosticsReporter, FileSink, LogSink, ReportSink,
    CV_FOLDS_DETAILED, DIAGNOSTICS_SUMMARY, FORECASTS_FULL_FIT, MODEL_COMPARISON,
};
