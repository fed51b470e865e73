//! Baseline forecasting models.
//!
//! Simple methods that serve as benchmarks for more complex models.

mod seasonal_naive;
mod sma;

pub use seasonal_naive::SeasonalNaive;
pub use sma::SimpleMovingAverage;
