//! Shared statistical helpers for the analysis modules
//!
//! Everything here is pure and total: degenerate inputs (empty slices,
//! zero variance) produce defined sentinel values instead of errors.

/// Arithmetic mean; `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; `0.0` for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Ordinary least-squares slope of `values` against the index `0..n`.
///
/// `None` when fewer than two points are supplied or the denominator
/// degenerates (it cannot for distinct integer x-values, but the guard
/// keeps the function total).
pub fn ols_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n_f * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }
    Some((n_f * sum_xy - sum_x * sum_y) / denominator)
}
