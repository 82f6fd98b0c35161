//! Greedy binary decision trees over numeric features.
//!
//! Induction follows the classic ID3/C4.5 recipe restricted to numeric threshold
//! tests:
//!
//! 1. For every attribute and every value it takes in the current partition,
//!    score the split `value <= threshold` by its weighted entropy.
//! 2. Split on the lowest-scoring candidate.
//! 3. Recurse on each side until every partition is label-pure.
//!
//! There is no pruning, depth limit or minimum leaf size: a trained tree
//! reproduces its training labels exactly. Training fails with
//! [`Error::NonSeparableData`](crate::Error::NonSeparableData) when records with
//! identical features carry different labels.
//!
//! Labels can be any `Clone + Ord` type. The trained tree is a plain value
//! ([`DecisionTree`]) that serializes with serde and renders as nested
//! `if`/`else` rules through [`DecisionTree::rules`].
//!
//! ```rust
//! use sift::tree::DecisionTree;
//!
//! let features = vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 1.0], vec![4.0, 1.0]];
//! let labels = ["low", "low", "high", "high"];
//!
//! let tree = DecisionTree::fit(&features, &labels).unwrap();
//! assert_eq!(*tree.classify(&[1.5, 0.0]).unwrap(), "low");
//! assert_eq!(tree.rules().to_string(), "if row[0] <= 2\n    low\nelse\n    high\n");
//! ```

mod builder;
mod entropy;
mod node;

pub use builder::DecisionTree;
pub use entropy::{best_split, weighted_entropy, Split};
pub use node::{DecisionNode, Rules};
