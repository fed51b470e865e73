//! Forecasting models.

mod traits;

pub mod arima;
pub mod baseline;
pub mod candidate;
pub mod exponential;
pub mod stl_arima;

pub use candidate::{attempt, CandidateSettings, ModelFit, ModelKind};
pub use stl_arima::StlArima;
pub use traits::{BoxedForecaster, Forecaster};
