//! # quarterly-forecast
//!
//! Model selection and forecasting for short quarterly economic series.
//!
//! Five candidate families (seasonal naive, a 4-quarter moving average,
//! additive Holt-Winters, an AIC-searched SARIMA and STL + ARIMA) are scored
//! by rolling-origin cross-validation on sMAPE and MASE. The best family is
//! refitted on the whole series to forecast the next quarters.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod seasonality;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, Period, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::io::{DiagnosticsReporter, SeriesLoader};
    pub use crate::models::{Forecaster, ModelKind};
    pub use crate::pipeline::{run_pipeline, PipelineConfig, PipelineRun};
    pub use crate::utils::{mase, smape};
}
