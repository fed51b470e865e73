//! Seasonal ARIMA models.
//!
//! This module provides:
//! - SARIMA(p, d, q)(P, D, Q)\[s\] estimated by conditional sum of squares
//! - An exhaustive AIC grid search over SARIMA orders

mod diff;
mod grid;
mod model;

pub use diff::{apply_polynomial, differencing_polynomial, integrate, poly_mul};
pub use grid::{GridFailure, SarimaGrid, SarimaSearch};
pub use model::{Sarima, SarimaOrder};
