use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::entropy::{best_split_rows, validate_labeled};
use super::node::{DecisionNode, Rules};
use crate::error::{Error, Result};

/// A trained decision tree over fixed-width numeric records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree<L> {
    root: DecisionNode<L>,
    n_features: usize,
}

impl<L: Clone + Ord> DecisionTree<L> {
    /// Grow a tree on `features` (one row per record) and `labels` (one per row).
    ///
    /// Each partition is split greedily by [`best_split`](super::best_split) until
    /// it is pure. There is no depth limit and no pruning, so the tree classifies
    /// its own training set without error.
    #[instrument(level = "debug", skip_all, fields(n = features.len()))]
    pub fn fit(features: &[Vec<f64>], labels: &[L]) -> Result<Self> {
        let n_features = validate_labeled(features, labels)?;
        let rows: Vec<usize> = (0..features.len()).collect();
        let root = grow(features, labels, rows, n_features)?;
        info!(
            depth = root.depth(),
            leaves = root.n_leaves(),
            "decision tree trained"
        );
        Ok(Self { root, n_features })
    }
}

impl<L> DecisionTree<L> {
    /// The root node.
    pub fn root(&self) -> &DecisionNode<L> {
        &self.root
    }

    /// Number of feature columns the tree was trained on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predict the label of one record.
    pub fn classify(&self, record: &[f64]) -> Result<&L> {
        if record.len() != self.n_features {
            return Err(Error::DimensionMismatch {
                expected: self.n_features,
                found: record.len(),
            });
        }
        self.root.classify(record)
    }

    /// Predict the label of every record.
    pub fn predict(&self, records: &[Vec<f64>]) -> Result<Vec<&L>> {
        records.iter().map(|r| self.classify(r)).collect()
    }

    /// Longest root-to-leaf path, in splits.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.root.n_nodes()
    }

    /// Human-readable `if`/`else` rendering.
    pub fn rules(&self) -> Rules<'_, L> {
        self.root.rules()
    }
}

enum Task {
    /// Build the subtree for `rows`.
    Grow { rows: Vec<usize>, depth: usize },
    /// Pop the two most recently built subtrees (right on top) under a split.
    Join { attribute: usize, threshold: f64 },
}

// Depth-first with an explicit worklist; tree depth is bounded only by purity.
fn grow<L: Clone + Ord>(
    features: &[Vec<f64>],
    labels: &[L],
    rows: Vec<usize>,
    dim: usize,
) -> Result<DecisionNode<L>> {
    let mut tasks = vec![Task::Grow { rows, depth: 0 }];
    let mut built: Vec<DecisionNode<L>> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Grow { rows, depth } => {
                let first = &labels[rows[0]];
                if rows.iter().all(|&r| labels[r] == *first) {
                    built.push(DecisionNode::Leaf {
                        label: first.clone(),
                    });
                    continue;
                }

                let split = best_split_rows(features, labels, &rows, dim)
                    .ok_or(Error::NonSeparableData { rows: rows.len() })?;
                debug!(
                    depth,
                    rows = rows.len(),
                    attribute = split.attribute,
                    threshold = split.threshold,
                    entropy = split.entropy,
                    "split"
                );

                // Both sides are non-empty: best_split_rows skips one-sided thresholds.
                let (left, right): (Vec<usize>, Vec<usize>) = rows
                    .into_iter()
                    .partition(|&r| features[r][split.attribute] <= split.threshold);

                tasks.push(Task::Join {
                    attribute: split.attribute,
                    threshold: split.threshold,
                });
                tasks.push(Task::Grow {
                    rows: right,
                    depth: depth + 1,
                });
                tasks.push(Task::Grow {
                    rows: left,
                    depth: depth + 1,
                });
            }
            Task::Join {
                attribute,
                threshold,
            } => {
                let (Some(right), Some(left)) = (built.pop(), built.pop()) else {
                    unreachable!("both subtrees are built before their join");
                };
                built.push(DecisionNode::Split {
                    attribute,
                    threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }
        }
    }

    let Some(root) = built.pop() else {
        unreachable!("the root task always builds a node");
    };
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_set() -> (Vec<Vec<f64>>, Vec<u8>) {
        let features = vec![
            vec![2.0, 3.0, 1.0, 4.0],
            vec![3.5, 8.2, 1.0, 5.5],
            vec![1.0, 9.0, 2.0, 2.0],
            vec![4.0, 1.5, 3.0, 6.0],
            vec![5.0, 4.9, 1.0, 5.2],
            vec![0.5, 7.0, 2.0, 3.0],
        ];
        let labels = vec![1, 0, 0, 1, 0, 1];
        (features, labels)
    }

    #[test]
    fn test_zero_training_error() {
        let (features, labels) = training_set();
        let tree = DecisionTree::fit(&features, &labels).unwrap();
        for (row, label) in features.iter().zip(&labels) {
            assert_eq!(tree.classify(row).unwrap(), label);
        }
        assert_eq!(tree.n_features(), 4);
    }

    #[test]
    fn test_single_split() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let labels = ["no", "no", "yes", "yes"];
        let tree = DecisionTree::fit(&features, &labels).unwrap();

        assert_eq!(
            *tree.root(),
            DecisionNode::Split {
                attribute: 0,
                threshold: 2.0,
                left: Box::new(DecisionNode::Leaf { label: "no" }),
                right: Box::new(DecisionNode::Leaf { label: "yes" }),
            }
        );
        assert_eq!(*tree.classify(&[2.5]).unwrap(), "yes");
        assert_eq!(*tree.classify(&[-10.0]).unwrap(), "no");
    }

    #[test]
    fn test_pure_input_is_a_leaf() {
        let features = vec![vec![1.0], vec![2.0]];
        let tree = DecisionTree::fit(&features, &[7, 7]).unwrap();
        assert_eq!(*tree.root(), DecisionNode::Leaf { label: 7 });
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_xor_needs_two_levels() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let labels = [0, 1, 1, 0];
        let tree = DecisionTree::fit(&features, &labels).unwrap();

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 4);
        assert_eq!(tree.predict(&features).unwrap(), vec![&0, &1, &1, &0]);
    }

    #[test]
    fn test_staircase_peels_one_row_per_level() {
        // Alternating labels along one axis: every split isolates a single end row.
        let n = 300;
        let features: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let labels: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
        let tree = DecisionTree::fit(&features, &labels).unwrap();

        assert_eq!(tree.depth(), n - 1);
        assert_eq!(tree.n_leaves(), n);
        assert_eq!(tree.n_nodes(), 2 * n - 1);
        assert_eq!(tree.rules().to_string().lines().count(), 2 * (n - 1) + n);
        for (row, label) in features.iter().zip(&labels) {
            assert_eq!(tree.classify(row).unwrap(), label);
        }
    }

    #[test]
    fn test_non_separable() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![3.0, 4.0]];
        let result = DecisionTree::fit(&features, &[0, 0, 1]);
        assert!(matches!(result, Err(Error::NonSeparableData { rows: 2 })));
    }

    #[test]
    fn test_classify_checks_width() {
        let (features, labels) = training_set();
        let tree = DecisionTree::fit(&features, &labels).unwrap();
        assert!(matches!(
            tree.classify(&[1.0, 2.0, 3.0]),
            Err(Error::DimensionMismatch {
                expected: 4,
                found: 3,
            })
        ));
    }

    #[test]
    fn test_invalid_input() {
        let empty: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            DecisionTree::<u8>::fit(&empty, &[]),
            Err(Error::EmptyInput)
        ));
        assert!(DecisionTree::fit(&[vec![1.0]], &[0, 1]).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let (features, labels) = training_set();
        let tree = DecisionTree::fit(&features, &labels).unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        let back: DecisionTree<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
