//! Euclidean distance and row validation shared by every clusterer.

use crate::error::{Error, Result};

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(squared_euclidean(a, b))
}

/// Euclidean distance between two equal-length vectors.
///
/// Computed as a scaled norm, so it stays finite whenever the true distance is
/// representable, even when the squared distance is not.
///
/// ```
/// use sift::cluster::distance;
///
/// assert_eq!(distance(&[0.0, 3.0], &[4.0, 0.0]).unwrap(), 5.0);
/// assert!(distance(&[0.0], &[0.0, 1.0]).is_err());
/// ```
pub fn distance(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(euclidean(a, b))
}

/// Check that `data` is non-empty, rectangular and finite. Returns the dimensionality.
pub fn validate_rows(data: &[Vec<f64>]) -> Result<usize> {
    let first = data.first().ok_or(Error::EmptyInput)?;
    let dim = first.len();
    if dim == 0 {
        return Err(Error::invalid("data", "rows have no columns"));
    }

    for (row, values) in data.iter().enumerate() {
        if values.len() != dim {
            return Err(Error::RaggedRow {
                row,
                expected: dim,
                found: values.len(),
            });
        }
        if let Some(col) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::invalid(
                "data",
                format!("row {row} column {col} is not finite ({})", values[col]),
            ));
        }
    }
    Ok(dim)
}

// Callers guarantee equal lengths (checked by `validate_rows` or `squared_distance`).
#[inline]
pub(crate) fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

// `m * sqrt(sum((d_i / m)^2))` with `m = max |d_i|`: no intermediate overflows.
#[inline]
pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let scale = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (x - y) / scale;
            d * d
        })
        .sum();
    scale * sum.sqrt()
}

/// Coordinate-wise mean of the rows selected by `members`.
///
/// Running mean, so large coordinates never overflow an intermediate sum.
pub(crate) fn mean_of(data: &[Vec<f64>], members: &[usize], dim: usize) -> Vec<f64> {
    let mut mean = vec![0.0; dim];
    for (seen, &m) in members.iter().enumerate() {
        let weight = (seen + 1) as f64;
        for (c, v) in mean.iter_mut().zip(&data[m]) {
            *c += (v - *c) / weight;
        }
    }
    mean
}

/// Round to `decimals` places, ties to even.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}
