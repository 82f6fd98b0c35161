//! K-means clustering (Lloyd iterations from randomly sampled records).
//!
//! `k` distinct records are sampled as initial centroids. Each iteration assigns
//! every record to its nearest centroid and then moves each centroid to the mean
//! of its members. Iteration stops when no centroid moves at all (exact equality).
//!
//! Every iteration builds a fresh cluster snapshot; the previous one is only read,
//! so the convergence test is plain value comparison.
//!
//! **Objective**: minimize the within-cluster sum of squares
//!
//! ```text
//! SSE = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Running over a range of `k` and plotting SSE ([`sse_sweep`]) gives the
//! elbow curve used to choose `k`.

use rand::prelude::*;
use rand::seq::index;
use tracing::{debug, info, instrument, warn};

use super::distance::{euclidean, mean_of, round_to, squared_euclidean, validate_rows};
use super::traits::Clustering;
use crate::error::{Error, Result};

/// K-means clusterer.
#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    seed: Option<u64>,
    max_iter: usize,
    centroid_decimals: Option<u32>,
}

/// One k-means cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansCluster {
    /// Cluster id in `0..k`.
    pub id: usize,
    /// Row indices assigned to this cluster, ascending.
    pub members: Vec<usize>,
    /// Cluster centroid.
    pub centroid: Vec<f64>,
}

/// Result of [`Kmeans::fit`].
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Final clusters, ordered by id.
    pub clusters: Vec<KmeansCluster>,
    /// Sum of squared distances from every record to its cluster centroid.
    ///
    /// Infinite when the squared distances exceed the `f64` range, even though
    /// the assignment itself is still exact.
    pub sse: f64,
    /// SSE contribution of each cluster, ordered by cluster id.
    pub cluster_sse: Vec<f64>,
    /// Number of assign/update rounds performed.
    pub iterations: usize,
    n_items: usize,
}

impl KmeansFit {
    /// Cluster id per record.
    pub fn labels(&self) -> Vec<usize> {
        let mut labels = vec![0; self.n_items];
        for cluster in &self.clusters {
            for &m in &cluster.members {
                labels[m] = cluster.id;
            }
        }
        labels
    }

    /// Final centroids, ordered by cluster id.
    pub fn centroids(&self) -> Vec<&[f64]> {
        self.clusters
            .iter()
            .map(|c| c.centroid.as_slice())
            .collect()
    }
}

impl Kmeans {
    /// Default iteration cap.
    pub const DEFAULT_MAX_ITER: usize = 300;

    /// Create a new k-means clusterer with `k` clusters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            seed: None,
            max_iter: Self::DEFAULT_MAX_ITER,
            centroid_decimals: None,
        }
    }

    /// Fix the RNG seed used to sample initial centroids.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cap the number of iterations; exceeding it fails with [`Error::NotConverged`].
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Round recomputed centroids to `decimals` places (`Some(0)`: nearest integer).
    ///
    /// Rounding makes convergence coarser and faster, at the cost of centroids that
    /// are no longer exact member means.
    pub fn with_centroid_decimals(mut self, decimals: Option<u32>) -> Self {
        self.centroid_decimals = decimals;
        self
    }

    fn validate(&self, n: usize) -> Result<()> {
        if self.k == 0 || self.k > n {
            return Err(Error::invalid(
                "k",
                format!("must be in 1..={n}, got {}", self.k),
            ));
        }
        if self.max_iter == 0 {
            return Err(Error::invalid("max_iter", "must be at least 1, got 0"));
        }
        Ok(())
    }

    /// Sample `k` distinct records as initial centroids.
    fn initialize(&self, data: &[Vec<f64>]) -> Vec<KmeansCluster> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        index::sample(&mut rng, data.len(), self.k)
            .into_iter()
            .enumerate()
            .map(|(id, idx)| KmeansCluster {
                id,
                members: vec![idx],
                centroid: data[idx].clone(),
            })
            .collect()
    }

    /// Recompute each centroid as the mean of its members.
    fn recompute_centroids(
        &self,
        clusters: Vec<KmeansCluster>,
        data: &[Vec<f64>],
        dim: usize,
    ) -> Vec<KmeansCluster> {
        clusters
            .into_iter()
            .map(|mut cluster| {
                if cluster.members.is_empty() {
                    warn!(
                        cluster = cluster.id,
                        "k-means cluster is empty, keeping its centroid"
                    );
                    return cluster;
                }
                let mut centroid = mean_of(data, &cluster.members, dim);
                if let Some(decimals) = self.centroid_decimals {
                    for c in &mut centroid {
                        *c = round_to(*c, decimals);
                    }
                }
                cluster.centroid = centroid;
                cluster
            })
            .collect()
    }

    /// Run k-means to convergence.
    #[instrument(level = "debug", skip_all, fields(n = data.len(), k = self.k))]
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KmeansFit> {
        let dim = validate_rows(data)?;
        self.validate(data.len())?;

        let mut previous: Vec<KmeansCluster> = Vec::new();
        let mut current = self.initialize(data);
        let mut iterations = 0;

        while !converged(&previous, &current) {
            if iterations == self.max_iter {
                return Err(Error::NotConverged { iterations });
            }
            let assigned = assign(&current, data);
            let next = self.recompute_centroids(assigned, data, dim);
            previous = std::mem::replace(&mut current, next);
            iterations += 1;
            debug!(iterations, "k-means iteration");
        }

        let cluster_sse: Vec<f64> = current.iter().map(|c| cluster_sse(c, data)).collect();
        let sse: f64 = cluster_sse.iter().sum();
        info!(k = self.k, iterations, sse, "k-means converged");
        Ok(KmeansFit {
            clusters: current,
            sse,
            cluster_sse,
            iterations,
            n_items: data.len(),
        })
    }
}

/// Assign every record to its nearest centroid, producing a new snapshot.
///
/// Ties go to the lowest cluster id.
fn assign(clusters: &[KmeansCluster], data: &[Vec<f64>]) -> Vec<KmeansCluster> {
    let mut next: Vec<KmeansCluster> = clusters
        .iter()
        .map(|c| KmeansCluster {
            id: c.id,
            members: Vec::new(),
            centroid: c.centroid.clone(),
        })
        .collect();

    for (idx, row) in data.iter().enumerate() {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (ci, cluster) in clusters.iter().enumerate() {
            let d = euclidean(row, &cluster.centroid);
            if d < best_dist {
                best_dist = d;
                best = ci;
            }
        }
        next[best].members.push(idx);
    }
    next
}

/// True when both snapshots are non-empty and no centroid differs.
fn converged(old: &[KmeansCluster], new: &[KmeansCluster]) -> bool {
    if old.is_empty() || new.is_empty() {
        return false;
    }
    old.len() == new.len() && old.iter().zip(new).all(|(a, b)| a.centroid == b.centroid)
}

fn cluster_sse(cluster: &KmeansCluster, data: &[Vec<f64>]) -> f64 {
    cluster
        .members
        .iter()
        .map(|&m| squared_euclidean(&data[m], &cluster.centroid))
        .sum()
}

/// Run k-means once per `k` and collect `(k, SSE)` pairs for an elbow plot.
pub fn sse_sweep(
    data: &[Vec<f64>],
    ks: impl IntoIterator<Item = usize>,
    seed: Option<u64>,
) -> Result<Vec<(usize, f64)>> {
    ks.into_iter()
        .map(|k| {
            let mut model = Kmeans::new(k);
            if let Some(s) = seed {
                model = model.with_seed(s);
            }
            Ok((k, model.fit(data)?.sse))
        })
        .collect()
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels())
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}
