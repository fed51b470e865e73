//! Error types for the quarterly forecasting pipeline.

use crate::pipeline::PipelineStage;
use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading, fitting or evaluating.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// A period label could not be parsed.
    #[error("unparsable period label: {0:?}")]
    PeriodParse(String),

    /// Periods are not strictly increasing.
    #[error("period error: {0}")]
    PeriodOrder(String),

    /// Missing or non-finite values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (non-convergence, singular system, non-finite output).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// A named column is absent from the input table.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// File system failure.
    #[error("io error: {0}")]
    Io(String),

    /// CSV reading or writing failure.
    #[error("csv error: {0}")]
    Csv(String),

    /// Configuration (de)serialisation failure.
    #[error("config error: {0}")]
    Config(String),

    /// The pipeline reached its terminal failed state.
    #[error("pipeline failed after {stage}: {reason}")]
    PipelineFailed { stage: PipelineStage, reason: String },
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = ForecastError::PeriodParse("2020 V".to_string());
        assert_eq!(err.to_string(), "unparsable period label: \"2020 V\"");

        let err = ForecastError::PipelineFailed {
            stage: PipelineStage::Loaded,
            reason: "no folds".to_string(),
        };
        assert_eq!(err.to_string(), "pipeline failed after loaded: no folds");
    }

    #[test]
    fn io_errors_convert_to_strings() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::Io(ref msg) if msg.contains("missing.csv")));
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::MissingValues;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
