//! Differencing utilities for SARIMA models.
//!
//! Differencing is expressed as a lag polynomial
//! `c(B) = (1 - B)^d (1 - B^s)^D` with `c[0] = 1`, so that applying and
//! inverting it share one set of coefficients.

/// Multiply two lag polynomials given as coefficient vectors.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Coefficients of `(1 - B)^d (1 - B^s)^D`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// Apply a differencing polynomial: `w_t = Σ c_k y_{t-k}`.
///
/// The output starts at `t = c.len() - 1` and is empty when the series is
/// not longer than the polynomial order.
pub fn apply_polynomial(series: &[f64], poly: &[f64]) -> Vec<f64> {
    let order = poly.len().saturating_sub(1);
    if poly.is_empty() || series.len() <= order {
        return Vec::new();
    }
    (order..series.len())
        .map(|t| {
            poly.iter()
                .enumerate()
                .map(|(k, c)| c * series[t - k])
                .sum()
        })
        .collect()
}

/// Invert differencing for forecasts: `y_t = w_t - Σ_{k≥1} c_k y_{t-k}`.
///
/// `history` is the undifferenced series the forecasts continue.
pub fn integrate(differenced: &[f64], history: &[f64], poly: &[f64]) -> Vec<f64> {
    if poly.len() <= 1 {
        return differenced.to_vec();
    }

    let mut extended = history.to_vec();
    let mut out = Vec::with_capacity(differenced.len());
    for &w in differenced {
        let t = extended.len();
        let lagged: f64 = poly
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, c)| if t >= k { c * extended[t - k] } else { 0.0 })
            .sum();
        let y = w - lagged;
        extended.push(y);
        out.push(y);
    }
    out
}
