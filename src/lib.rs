//! Small-table machine learning.
//!
//! `sift` is a small library of classic algorithms for in-memory numeric tables:
//!
//! - [`cluster`]: agglomerative clustering, DBSCAN and k-means, plus the shared
//!   Euclidean distance engine and a density prefilter
//! - [`tree`]: greedy entropy-minimizing binary decision trees
//!
//! All algorithms are exact, single-threaded and O(n²) or worse; they target
//! datasets of up to a few thousand rows.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod tree;

pub use cluster::{
    Agglomerative, AgglomerativeFit, Clustering, Dbscan, DbscanFit, DensityFilter, Kmeans,
    KmeansFit, NOISE,
};
pub use error::{Error, Result};
pub use tree::{DecisionNode, DecisionTree};
