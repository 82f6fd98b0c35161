//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN groups points by neighborhood density. Unlike k-means, it:
//!
//! - Discovers clusters of arbitrary shape
//! - Determines the number of clusters from the data
//! - Identifies noise points (outliers)
//!
//! ## Core Concepts
//!
//! - **Epsilon (ε)**: Two points are neighbors when their distance is *strictly* below ε.
//! - **MinPts**: Minimum neighborhood size for a point to be "core". The neighborhood
//!   of a point includes the point itself.
//! - **Core point**: Has at least MinPts neighbors.
//! - **Border point**: In the neighborhood of a core point but not core itself.
//! - **Noise point**: Neither core nor border.
//!
//! ## Algorithm Steps
//!
//! 1. For each unvisited point P:
//!    - Find its neighbors
//!    - If |neighbors| < MinPts, mark as noise (may become a border point later)
//!    - Else P is core: start a new cluster and expand it
//!
//! 2. Expansion: for each point in the frontier:
//!    - Add it to the cluster unless another cluster already owns it
//!    - If it is core, push its neighbors onto the frontier
//!
//! Every point ends up in exactly one cluster or in the noise set. A border point
//! reachable from two clusters belongs to the one that reached it first.
//!
//! ## Complexity
//!
//! - **Time**: O(n²): one full scan per visited point.
//! - **Space**: O(n) for labels.
//!
//! ## Choosing ε
//!
//! [`k_distance`] returns the sorted distance of every point to its k-th nearest
//! neighbor. The "knee" of that curve is a good ε for `min_pts = k + 1`.

use std::collections::VecDeque;

use tracing::{debug, info, instrument};

use super::distance::{distance, euclidean, mean_of, round_to, validate_rows};
use super::traits::Clustering;
use crate::error::{Error, Result};

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Epsilon: neighborhood radius (exclusive).
    epsilon: f64,
    /// Minimum neighborhood size (self included) for a core point.
    min_pts: usize,
}

/// Label assigned to noise points by [`Clustering::fit_predict`].
pub const NOISE: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unclassified,
    // Visited, not density-reachable so far; may be promoted to a border point.
    Noise,
    Cluster(usize),
}

/// Result of [`Dbscan::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct DbscanFit {
    /// Clusters in discovery order, each a list of row indices (ascending).
    pub clusters: Vec<Vec<usize>>,
    /// Rows that belong to no cluster (ascending).
    pub noise: Vec<usize>,
    n_items: usize,
}

/// Size and location of one DBSCAN cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    /// Index into [`DbscanFit::clusters`].
    pub cluster: usize,
    /// Number of members.
    pub size: usize,
    /// Member mean rounded to 2 decimals.
    pub centroid: Vec<f64>,
}

impl DbscanFit {
    /// Number of clusters found.
    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Coordinate-wise mean of cluster `cluster`, rounded to 2 decimal places.
    pub fn centroid(&self, cluster: usize, data: &[Vec<f64>]) -> Result<Vec<f64>> {
        let members = self.clusters.get(cluster).ok_or_else(|| {
            Error::invalid(
                "cluster",
                format!("{cluster} out of range ({} clusters)", self.clusters.len()),
            )
        })?;
        let dim = validate_rows(data)?;
        if let Some(&m) = members.iter().find(|&&m| m >= data.len()) {
            return Err(Error::invalid(
                "data",
                format!("member {m} out of range ({} rows)", data.len()),
            ));
        }
        Ok(mean_of(data, members, dim)
            .into_iter()
            .map(|c| round_to(c, 2))
            .collect())
    }

    /// One summary per cluster, ordered by size ascending (discovery order on ties).
    pub fn summary(&self, data: &[Vec<f64>]) -> Result<Vec<ClusterSummary>> {
        let mut out = (0..self.clusters.len())
            .map(|cluster| {
                Ok(ClusterSummary {
                    cluster,
                    size: self.clusters[cluster].len(),
                    centroid: self.centroid(cluster, data)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        out.sort_by_key(|s| s.size);
        Ok(out)
    }

    /// Cluster label per row, [`NOISE`] for noise.
    pub fn labels(&self) -> Vec<usize> {
        let mut labels = vec![NOISE; self.n_items];
        for (label, members) in self.clusters.iter().enumerate() {
            for &m in members {
                labels[m] = label;
            }
        }
        labels
    }
}

/// Indices of every row of `data` strictly within `epsilon` of `point`, itself included.
pub fn neighbors(data: &[Vec<f64>], point: &[f64], epsilon: f64) -> Result<Vec<usize>> {
    check_epsilon(epsilon)?;
    let mut out = Vec::new();
    for (idx, other) in data.iter().enumerate() {
        if distance(point, other)? < epsilon {
            out.push(idx);
        }
    }
    Ok(out)
}

/// Distance from every point to its `k`-th nearest neighbor, sorted ascending.
///
/// Each point is its own 0-th neighbor, so `k` must be in `1..n`.
pub fn k_distance(data: &[Vec<f64>], k: usize) -> Result<Vec<f64>> {
    validate_rows(data)?;
    let n = data.len();
    if k == 0 || k >= n {
        return Err(Error::invalid("k", format!("must be in 1..{n}, got {k}")));
    }

    let mut out: Vec<f64> = data
        .iter()
        .map(|p| {
            let mut dists: Vec<f64> = data.iter().map(|q| euclidean(p, q)).collect();
            dists.sort_by(f64::total_cmp);
            dists[k]
        })
        .collect();
    out.sort_by(f64::total_cmp);
    Ok(out)
}

fn check_epsilon(epsilon: f64) -> Result<()> {
    // Rejects NaN too.
    if epsilon > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(
            "epsilon",
            format!("must be positive, got {epsilon}"),
        ))
    }
}

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Exclusive neighborhood radius.
    /// * `min_pts` - Minimum neighborhood size, counting the point itself.
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self { epsilon, min_pts }
    }

    /// Set epsilon (neighborhood radius).
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set minimum points for core classification.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Find all neighbors of row `point_idx`, itself included.
    fn region_query(&self, data: &[Vec<f64>], point_idx: usize) -> Vec<usize> {
        let point = &data[point_idx];
        data.iter()
            .enumerate()
            .filter(|(_, other)| euclidean(point, other) < self.epsilon)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Grow cluster `cluster_id` from a core point and its neighborhood.
    fn expand_cluster(
        &self,
        data: &[Vec<f64>],
        point_idx: usize,
        neighbors: Vec<usize>,
        labels: &mut [Label],
        cluster_id: usize,
        visited: &mut [bool],
    ) {
        labels[point_idx] = Label::Cluster(cluster_id);

        let mut queued = vec![false; data.len()];
        for &nb in &neighbors {
            queued[nb] = true;
        }
        let mut frontier: VecDeque<usize> = neighbors.into();

        while let Some(idx) = frontier.pop_front() {
            // Provisional noise becomes a border point; points owned by an
            // earlier cluster stay where they are.
            if matches!(labels[idx], Label::Unclassified | Label::Noise) {
                labels[idx] = Label::Cluster(cluster_id);
            }

            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            let reach = self.region_query(data, idx);
            if reach.len() >= self.min_pts {
                for nb in reach {
                    if !visited[nb] && !queued[nb] {
                        queued[nb] = true;
                        frontier.push_back(nb);
                    }
                }
            }
        }
    }

    /// Cluster `data` into density-connected groups plus noise.
    #[instrument(level = "debug", skip_all, fields(n = data.len()))]
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<DbscanFit> {
        validate_rows(data)?;
        check_epsilon(self.epsilon)?;
        if self.min_pts == 0 {
            return Err(Error::invalid("min_pts", "must be at least 1, got 0"));
        }

        let n = data.len();
        let mut labels = vec![Label::Unclassified; n];
        let mut visited = vec![false; n];
        let mut cluster_id = 0;

        for point_idx in 0..n {
            if visited[point_idx] {
                continue;
            }
            visited[point_idx] = true;

            let neighbors = self.region_query(data, point_idx);
            if neighbors.len() < self.min_pts {
                labels[point_idx] = Label::Noise;
                continue;
            }

            debug!(cluster_id, seed = point_idx, "expanding cluster");
            self.expand_cluster(
                data,
                point_idx,
                neighbors,
                &mut labels,
                cluster_id,
                &mut visited,
            );
            cluster_id += 1;
        }

        let mut clusters = vec![Vec::new(); cluster_id];
        let mut noise = Vec::new();
        for (idx, label) in labels.into_iter().enumerate() {
            match label {
                Label::Cluster(c) => clusters[c].push(idx),
                Label::Noise | Label::Unclassified => noise.push(idx),
            }
        }

        info!(
            clusters = clusters.len(),
            noise = noise.len(),
            "dbscan done"
        );
        Ok(DbscanFit {
            clusters,
            noise,
            n_items: n,
        })
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 5)
    }
}

impl Clustering for Dbscan {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels())
    }

    /// DBSCAN discovers clusters dynamically, so this returns 0.
    fn n_clusters(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_points() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 10.0],
            vec![10.0, 11.0],
        ]
    }

    #[test]
    fn test_dbscan_two_pairs() {
        let fit = Dbscan::new(1.5, 2).fit(&four_points()).unwrap();

        assert_eq!(fit.clusters, vec![vec![0, 1], vec![2, 3]]);
        assert!(fit.noise.is_empty());
        assert_eq!(fit.centroid(0, &four_points()).unwrap(), vec![0.0, 0.5]);
        assert_eq!(fit.centroid(1, &four_points()).unwrap(), vec![10.0, 10.5]);
    }

    #[test]
    fn test_dbscan_two_clusters() {
        let data = vec![
            // Cluster 1: around (0, 0)
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![0.1, 0.1],
            vec![0.05, 0.05],
            // Cluster 2: around (5, 5)
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
            vec![5.1, 5.1],
            vec![5.05, 5.05],
        ];

        let labels = Dbscan::new(0.3, 3).fit_predict(&data).unwrap();

        assert_eq!(labels.len(), 10);
        let cluster1 = labels[0];
        for label in &labels[1..5] {
            assert_eq!(*label, cluster1);
        }
        let cluster2 = labels[5];
        for label in &labels[6..10] {
            assert_eq!(*label, cluster2);
        }
        assert_ne!(cluster1, cluster2);
    }

    #[test]
    fn test_dbscan_with_noise() {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![0.1, 0.1],
            // Outlier
            vec![100.0, 100.0],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
            vec![5.1, 5.1],
        ];

        let fit = Dbscan::new(0.3, 3).fit(&data).unwrap();

        assert_eq!(fit.noise, vec![4]);
        assert_eq!(fit.n_clusters(), 2);
        let labels = fit.labels();
        assert_eq!(labels.len(), data.len());
        assert_eq!(labels[4], NOISE);
        for (i, label) in labels.iter().enumerate() {
            if i != 4 {
                assert_ne!(*label, NOISE);
            }
        }
    }

    #[test]
    fn test_dbscan_all_noise() {
        let data = vec![
            vec![0.0, 0.0],
            vec![10.0, 0.0],
            vec![0.0, 10.0],
            vec![10.0, 10.0],
        ];

        let fit = Dbscan::new(0.5, 3).fit(&data).unwrap();
        assert!(fit.clusters.is_empty());
        assert_eq!(fit.noise, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_min_pts_one_makes_every_point_core() {
        let data = vec![vec![0.0], vec![10.0], vec![20.0]];
        let fit = Dbscan::new(1.0, 1).fit(&data).unwrap();
        assert_eq!(fit.clusters, vec![vec![0], vec![1], vec![2]]);
        assert!(fit.noise.is_empty());
    }

    #[test]
    fn test_radius_is_exclusive() {
        // Exactly eps apart: not neighbors.
        let data = vec![vec![0.0], vec![1.0]];
        let fit = Dbscan::new(1.0, 2).fit(&data).unwrap();
        assert!(fit.clusters.is_empty());
        assert_eq!(fit.noise, vec![0, 1]);
    }

    #[test]
    fn test_noise_promoted_to_border() {
        // Row 0 is visited first and is not core; row 1 is core and reaches it.
        let data = vec![vec![0.0], vec![0.9], vec![1.8]];
        let fit = Dbscan::new(1.0, 3).fit(&data).unwrap();
        assert_eq!(fit.clusters, vec![vec![0, 1, 2]]);
        assert!(fit.noise.is_empty());
    }

    #[test]
    fn test_shared_border_point_assigned_once() {
        // Row 3 (x = 12) lies within eps of a core point of each cluster.
        let data = vec![
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![12.0],
            vec![22.0],
            vec![23.0],
            vec![24.0],
        ];
        let fit = Dbscan::new(10.5, 4).fit(&data).unwrap();

        assert_eq!(fit.clusters, vec![vec![0, 1, 2, 3], vec![4, 5, 6]]);
        assert!(fit.noise.is_empty());
    }

    #[test]
    fn test_dbscan_chain() {
        let data: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64 * 0.3, 0.0]).collect();

        let labels = Dbscan::new(0.5, 2).fit_predict(&data).unwrap();
        let cluster = labels[0];
        for label in labels {
            assert_eq!(label, cluster);
        }
    }

    #[test]
    fn test_summary_sorted_by_size() {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 2.0],
            vec![10.0, 10.0],
            vec![10.0, 11.0],
        ];
        let fit = Dbscan::new(1.5, 2).fit(&data).unwrap();
        let summary = fit.summary(&data).unwrap();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].cluster, 1);
        assert_eq!(summary[0].size, 2);
        assert_eq!(summary[0].centroid, vec![10.0, 10.5]);
        assert_eq!(summary[1].size, 3);
        assert_eq!(summary[1].centroid, vec![0.0, 1.0]);
    }

    #[test]
    fn test_centroid_rounding() {
        let data = vec![vec![0.0], vec![0.0], vec![1.0]];
        let fit = DbscanFit {
            clusters: vec![vec![0, 1, 2]],
            noise: vec![],
            n_items: 3,
        };
        assert_eq!(fit.centroid(0, &data).unwrap(), vec![0.33]);
        assert!(fit.centroid(1, &data).is_err());
    }

    #[test]
    fn test_centroid_rounds_ties_to_even() {
        let data = vec![vec![0.0], vec![0.25]];
        let fit = Dbscan::new(1.0, 2).fit(&data).unwrap();
        assert_eq!(fit.centroid(0, &data).unwrap(), vec![0.12]);
    }

    #[test]
    fn test_labels_cover_every_row() {
        let data = vec![vec![0.0], vec![0.5], vec![50.0], vec![100.0]];
        let fit = Dbscan::new(1.0, 2).fit(&data).unwrap();
        assert_eq!(fit.labels(), vec![0, 0, NOISE, NOISE]);
    }

    #[test]
    fn test_dbscan_large_magnitudes() {
        // Pairwise squared distances overflow f64; the distances do not.
        let data = vec![vec![1e160], vec![3e160], vec![1e163]];
        let fit = Dbscan::new(2.5e160, 2).fit(&data).unwrap();
        assert_eq!(fit.clusters, vec![vec![0, 1]]);
        assert_eq!(fit.noise, vec![2]);

        let fit = Dbscan::new(1e161, 2).fit(&data[..2]).unwrap();
        assert_eq!(fit.clusters, vec![vec![0, 1]]);

        assert_eq!(neighbors(&data, &[2e160], 1.5e160).unwrap(), vec![0, 1]);
        let gap = 3e160 - 1e160;
        assert_eq!(k_distance(&data[..2], 1).unwrap(), vec![gap, gap]);
    }

    #[test]
    fn test_neighbors_includes_self() {
        let nb = neighbors(&four_points(), &[0.0, 0.0], 1.5).unwrap();
        assert_eq!(nb, vec![0, 1]);
        assert!(neighbors(&four_points(), &[0.0], 1.5).is_err());
        assert!(neighbors(&four_points(), &[0.0, 0.0], 0.0).is_err());
    }

    #[test]
    fn test_k_distance() {
        let data = vec![vec![0.0], vec![1.0], vec![3.0]];
        assert_eq!(k_distance(&data, 1).unwrap(), vec![1.0, 1.0, 2.0]);
        assert_eq!(k_distance(&data, 2).unwrap(), vec![2.0, 3.0, 3.0]);
        assert!(k_distance(&data, 0).is_err());
        assert!(k_distance(&data, 3).is_err());
    }

    #[test]
    fn test_dbscan_empty() {
        let data: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            Dbscan::new(0.5, 3).fit(&data),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_dbscan_invalid_params() {
        let data = vec![vec![0.0, 0.0]];

        assert!(Dbscan::new(0.0, 3).fit_predict(&data).is_err());
        assert!(Dbscan::new(-1.0, 3).fit_predict(&data).is_err());
        assert!(Dbscan::new(f64::NAN, 3).fit_predict(&data).is_err());
        assert!(matches!(
            Dbscan::new(0.5, 0).fit(&data),
            Err(Error::InvalidParameter {
                name: "min_pts",
                ..
            })
        ));
    }
}
