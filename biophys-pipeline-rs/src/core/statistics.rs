//! Descriptive statistics over sample slices.
//!
//! Standard deviations are population estimates (divide by `n`), matching
//! how the per-track and across-track spreads are reported.

use super::tracks::Vector2;

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, or `None` for an empty slice.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Mean and population standard deviation in one call.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    Some((mean(values)?, std_dev(values)?))
}

/// Component-wise mean and standard deviation of a list of vectors.
pub fn vector_mean_std(values: &[Vector2]) -> Option<(Vector2, Vector2)> {
    let first: Vec<f64> = values.iter().map(|v| v[0]).collect();
    let second: Vec<f64> = values.iter().map(|v| v[1]).collect();

    let (m0, s0) = mean_std(&first)?;
    let (m1, s1) = mean_std(&second)?;
    Some(([m0, m1], [s0, s1]))
}
