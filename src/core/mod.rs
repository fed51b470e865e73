//! Core data structures: quarterly periods, series and forecasts.

mod forecast;
mod period;
mod time_series;

pub use forecast::Forecast;
pub use period::{Period, QUARTERS_PER_YEAR};
pub use time_series::TimeSeries;
