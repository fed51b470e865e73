//! Utility functions for forecasting models.

pub mod metrics;
pub mod optimization;
pub mod parallel;
pub mod stats;

pub use metrics::{mae, mase, nan_mean, smape};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use parallel::ordered_map;
pub use stats::{normal_critical_value, quantile_normal};
