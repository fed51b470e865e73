//! Pipeline configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::evaluation::RollingOrigin;
use crate::models::arima::SarimaSearch;
use crate::models::CandidateSettings;

/// Configuration for one pipeline run.
///
/// Every field has a default, so a JSON file only needs the keys it
/// changes.
///
/// # Example
///
/// ```
/// use quarterly_forecast::pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default().with_horizon(4).with_min_train(10);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.seasonal_period, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the numeric target column.
    pub target_column: String,
    /// Name of the period-label column.
    pub period_column: String,
    /// Observations per seasonal cycle.
    pub seasonal_period: usize,
    /// Number of future quarters to forecast.
    pub horizon: usize,
    /// Training points in the first cross-validation fold.
    pub min_train: usize,
    /// Reduced minimum used when `min_train` leaves no fold.
    pub fallback_min_train: usize,
    /// Window of the moving-average candidate.
    pub sma_window: usize,
    /// Confidence level of the reported forecast bounds.
    pub confidence_level: f64,
    /// Below this many observations a warning is logged.
    pub min_recommended_observations: usize,
    /// SARIMA order search bounds.
    pub sarima: SarimaSearch,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: "Nağd_pul_kredit_satışı".to_string(),
            period_column: "period label".to_string(),
            seasonal_period: 4,
            horizon: 2,
            min_train: 8,
            fallback_min_train: 6,
            sma_window: 4,
            confidence_level: 0.95,
            min_recommended_observations: 8,
            sarima: SarimaSearch::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config)
    }

    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    pub fn with_period_column(mut self, column: impl Into<String>) -> Self {
        self.period_column = column.into();
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_min_train(mut self, min_train: usize) -> Self {
        self.min_train = min_train;
        self
    }

    pub fn with_fallback_min_train(mut self, min_train: usize) -> Self {
        self.fallback_min_train = min_train;
        self
    }

    pub fn with_sarima(mut self, search: SarimaSearch) -> Self {
        self.sarima = search;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Reject settings no run could use.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(ForecastError::InvalidParameter(msg)) };
        if self.horizon == 0 {
            return invalid("horizon must be positive".to_string());
        }
        if self.seasonal_period == 0 {
            return invalid("seasonal_period must be positive".to_string());
        }
        if self.sma_window == 0 {
            return invalid("sma_window must be positive".to_string());
        }
        if self.fallback_min_train == 0 || self.fallback_min_train >= self.min_train {
            return invalid(format!(
                "fallback_min_train ({}) must be positive and below min_train ({})",
                self.fallback_min_train, self.min_train
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return invalid(format!(
                "confidence_level must lie in (0, 1), got {}",
                self.confidence_level
            ));
        }
        self.sarima.validate()
    }

    /// Settings handed to every candidate model.
    pub fn candidate_settings(&self) -> CandidateSettings {
        CandidateSettings {
            seasonal_period: self.seasonal_period,
            sma_window: self.sma_window,
            search: self.sarima.clone(),
        }
    }

    pub(crate) fn rolling_origin(&self, min_train: usize) -> RollingOrigin {
        RollingOrigin::new(min_train, self.horizon)
    }
}
