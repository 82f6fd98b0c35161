//! Agglomerative (bottom-up hierarchical) clustering with centroid linkage.
//!
//! Every record starts as its own cluster. At each step the two clusters whose
//! centroids are closest are merged; the merged centroid is the size-weighted mean
//! of the two input centroids, which equals the mean of every member record. The
//! merge history forms a dendrogram.
//!
//! ## Complexity
//!
//! - **Time**: O(n³) overall, O(k²) per nearest-pair scan with k live clusters.
//! - **Space**: O(n·d) for the centroid arena.
//!
//! ## Identity
//!
//! Clusters live in an arena addressed by the row index they started from. A merge
//! keeps the lower handle and tombstones the higher one, so handles never collide
//! and are never reused.

use tracing::{debug, info, instrument};

use super::distance::{euclidean, validate_rows};
use super::traits::Clustering;
use crate::error::{Error, Result};

/// Agglomerative clustering.
#[derive(Debug, Clone)]
pub struct Agglomerative {
    /// Stop merging once this many clusters remain.
    n_clusters: usize,
}

/// One merge step of the dendrogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    /// Handle of the surviving cluster (the lower of the two).
    pub kept: usize,
    /// Handle of the cluster absorbed into `kept`.
    pub absorbed: usize,
    /// Centroid distance between the two clusters at merge time.
    pub distance: f64,
    /// Member count of the merged cluster.
    pub size: usize,
}

/// A cluster of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Stable handle: the lowest row index the cluster grew from.
    pub id: usize,
    /// Row indices of the member records, ascending.
    pub members: Vec<usize>,
    /// Coordinate-wise mean of the member records.
    pub centroid: Vec<f64>,
}

/// Result of [`Agglomerative::fit`].
#[derive(Debug, Clone)]
pub struct AgglomerativeFit {
    /// Merges in the order they happened.
    pub merges: Vec<Merge>,
    /// Remaining clusters, ordered by id.
    pub clusters: Vec<Cluster>,
    n_items: usize,
}

impl AgglomerativeFit {
    /// Cluster label per record: the position of its cluster in [`Self::clusters`].
    pub fn labels(&self) -> Vec<usize> {
        let mut labels = vec![0; self.n_items];
        for (label, cluster) in self.clusters.iter().enumerate() {
            for &m in &cluster.members {
                labels[m] = label;
            }
        }
        labels
    }
}

#[derive(Debug, Clone)]
struct Slot {
    members: Vec<usize>,
    centroid: Vec<f64>,
}

/// Clusters addressed by stable handles. Removed clusters leave a tombstone.
#[derive(Debug, Clone)]
struct ClusterArena {
    slots: Vec<Option<Slot>>,
    live: usize,
}

impl ClusterArena {
    /// One singleton cluster per record; the centroid is the record itself.
    fn initialize(data: &[Vec<f64>]) -> Self {
        let slots = data
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Some(Slot {
                    members: vec![i],
                    centroid: row.clone(),
                })
            })
            .collect();
        Self {
            slots,
            live: data.len(),
        }
    }

    fn live(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|s| (id, s)))
    }

    /// Closest pair `(id1, id2, distance)` with `id1 < id2`.
    ///
    /// Ties keep the earliest pair in handle order.
    fn nearest_pair(&self) -> Option<(usize, usize, f64)> {
        let mut best: Option<(usize, usize, f64)> = None;
        for (id1, a) in self.live() {
            for (id2, b) in self.live().filter(|(id2, _)| *id2 > id1) {
                let d = euclidean(&a.centroid, &b.centroid);
                if best.is_none_or(|(_, _, bd)| d < bd) {
                    best = Some((id1, id2, d));
                }
            }
        }
        best
    }

    /// Merge `id2` into `id1`. Returns the merged size.
    fn merge(&mut self, id1: usize, id2: usize) -> Result<usize> {
        if id1 == id2 || self.slots.get(id1).is_none_or(Option::is_none) {
            return Err(not_live("id1", id1));
        }
        let absorbed = self
            .slots
            .get_mut(id2)
            .and_then(Option::take)
            .ok_or_else(|| not_live("id2", id2))?;
        let kept = self.slots[id1]
            .as_mut()
            .ok_or_else(|| not_live("id1", id1))?;

        // Size-weighted mean, written as a step from `c1` towards `c2`.
        let n1 = kept.members.len() as f64;
        let n2 = absorbed.members.len() as f64;
        let weight = n2 / (n1 + n2);
        for (c1, c2) in kept.centroid.iter_mut().zip(&absorbed.centroid) {
            *c1 += (c2 - *c1) * weight;
        }
        kept.members.extend(absorbed.members);
        kept.members.sort_unstable();

        self.live -= 1;
        Ok(kept.members.len())
    }

    fn into_clusters(self) -> Vec<Cluster> {
        self.slots
            .into_iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                slot.map(|s| Cluster {
                    id,
                    members: s.members,
                    centroid: s.centroid,
                })
            })
            .collect()
    }
}

fn not_live(name: &'static str, id: usize) -> Error {
    Error::invalid(name, format!("cluster {id} is not live"))
}

impl Agglomerative {
    /// Merge all the way down to a single cluster.
    pub fn new() -> Self {
        Self { n_clusters: 1 }
    }

    /// Stop once `n_clusters` clusters remain.
    pub fn with_n_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    /// Run the merge loop and return the dendrogram plus the remaining clusters.
    #[instrument(level = "debug", skip_all, fields(n = data.len()))]
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<AgglomerativeFit> {
        validate_rows(data)?;
        let n = data.len();
        if self.n_clusters == 0 || self.n_clusters > n {
            return Err(Error::invalid(
                "n_clusters",
                format!("must be in 1..={n}, got {}", self.n_clusters),
            ));
        }

        let mut arena = ClusterArena::initialize(data);
        let mut merges = Vec::with_capacity(n - self.n_clusters);

        while arena.live > self.n_clusters {
            let Some((id1, id2, distance)) = arena.nearest_pair() else {
                break;
            };
            let size = arena.merge(id1, id2)?;
            debug!(
                kept = id1,
                absorbed = id2,
                distance,
                size,
                "merged clusters"
            );
            merges.push(Merge {
                kept: id1,
                absorbed: id2,
                distance,
                size,
            });
        }

        let clusters = arena.into_clusters();
        info!(
            merges = merges.len(),
            clusters = clusters.len(),
            "agglomerative clustering done"
        );
        Ok(AgglomerativeFit {
            merges,
            clusters,
            n_items: n,
        })
    }
}

impl Default for Agglomerative {
    fn default() -> Self {
        Self::new()
    }
}

impl Clustering for Agglomerative {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels())
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}
