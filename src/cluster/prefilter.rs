//! Density-based outlier removal ahead of centroid clustering.
//!
//! K-means has no notion of noise: a single far-away record drags a centroid
//! towards it. [`DensityFilter`] drops records that have too few other records
//! nearby before clustering.

use tracing::{debug, instrument};

use super::distance::{euclidean, validate_rows};
use crate::error::{Error, Result};

/// Keep only records with at least `min_neighbors` other records within `radius`.
#[derive(Debug, Clone)]
pub struct DensityFilter {
    radius: f64,
    min_neighbors: usize,
}

impl DensityFilter {
    /// Create a filter. The radius is inclusive.
    pub fn new(radius: f64, min_neighbors: usize) -> Self {
        Self {
            radius,
            min_neighbors,
        }
    }

    /// Indices of the records that pass the filter, in input order.
    #[instrument(level = "debug", skip_all, fields(n = data.len()))]
    pub fn retain(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        validate_rows(data)?;
        if self.radius.is_nan() || self.radius < 0.0 {
            return Err(Error::invalid(
                "radius",
                format!("must be non-negative, got {}", self.radius),
            ));
        }

        let kept: Vec<usize> = (0..data.len())
            .filter(|&i| {
                let close = data
                    .iter()
                    .enumerate()
                    .filter(|&(j, other)| j != i && self.within(&data[i], other))
                    .take(self.min_neighbors)
                    .count();
                close >= self.min_neighbors
            })
            .collect();

        let dropped = data.len() - kept.len();
        debug!(kept = kept.len(), dropped, "density filter");
        Ok(kept)
    }

    fn within(&self, a: &[f64], b: &[f64]) -> bool {
        euclidean(a, b) <= self.radius
    }

    /// The records that pass the filter, cloned, in input order.
    pub fn apply(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        Ok(self
            .retain(data)?
            .into_iter()
            .map(|i| data[i].clone())
            .collect())
    }
}
