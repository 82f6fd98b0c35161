//! Clustering algorithms for small in-memory tables.
//!
//! Every algorithm takes a dataset as `&[Vec<f64>]`: one inner vector per record,
//! all of the same length. Inputs are validated up front (non-empty, rectangular,
//! finite) and all distances are Euclidean.
//!
//! ## Algorithms
//!
//! ### Agglomerative
//!
//! Bottom-up hierarchical clustering: start with one cluster per record and
//! repeatedly merge the two clusters with the closest centroids. The merge
//! history is a dendrogram; stopping early gives a flat clustering.
//!
//! ### DBSCAN
//!
//! Density-based clustering that discovers non-convex clusters and identifies
//! outliers (noise points). DBSCAN does not require the number of clusters in
//! advance, but needs a neighborhood radius; [`k_distance`] helps choose it.
//!
//! ### K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then move
//! each centroid to the mean of its points. Repeat until nothing moves.
//!
//! **Objective**: minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**:
//! - Clusters are roughly spherical
//! - Clusters have similar sizes
//! - You know k in advance, or pick it from an [`sse_sweep`] elbow
//!
//! ## Usage
//!
//! ```rust
//! use sift::cluster::{Agglomerative, Clustering, Dbscan, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 10.0],
//!     vec![10.0, 11.0],
//! ];
//!
//! let fit = Kmeans::new(2).with_seed(42).fit(&data).unwrap();
//! assert_eq!(fit.sse, 1.0);
//!
//! let fit = Dbscan::new(1.5, 2).fit(&data).unwrap();
//! assert_eq!(fit.clusters, vec![vec![0, 1], vec![2, 3]]);
//! assert!(fit.noise.is_empty());
//!
//! let labels = Agglomerative::new().with_n_clusters(2).fit_predict(&data).unwrap();
//! assert_eq!(labels, vec![0, 0, 1, 1]);
//! ```

mod agglomerative;
mod dbscan;
mod distance;
mod kmeans;
mod prefilter;
mod traits;

pub use agglomerative::{Agglomerative, AgglomerativeFit, Cluster, Merge};
pub use dbscan::{k_distance, neighbors, ClusterSummary, Dbscan, DbscanFit, NOISE};
pub use distance::{distance, squared_distance, validate_rows};
pub use kmeans::{sse_sweep, Kmeans, KmeansCluster, KmeansFit};
pub use prefilter::DensityFilter;
pub use traits::Clustering;
