use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A node of a binary decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionNode<L> {
    /// Every training record routed here has this label.
    Leaf {
        /// The predicted label.
        label: L,
    },
    /// Route on `record[attribute] <= threshold`.
    Split {
        /// Column tested.
        attribute: usize,
        /// Values at or below go left.
        threshold: f64,
        /// Subtree for `record[attribute] <= threshold`.
        left: Box<DecisionNode<L>>,
        /// Subtree for `record[attribute] > threshold`.
        right: Box<DecisionNode<L>>,
    },
}

impl<L> DecisionNode<L> {
    /// Walk from this node to a leaf and return its label.
    pub fn classify(&self, record: &[f64]) -> Result<&L> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { label } => return Ok(label),
                Self::Split {
                    attribute,
                    threshold,
                    left,
                    right,
                } => {
                    let Some(value) = record.get(*attribute) else {
                        return Err(Error::DimensionMismatch {
                            expected: attribute + 1,
                            found: record.len(),
                        });
                    };
                    node = if *value <= *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }

    /// Number of split levels on the longest root-to-leaf path (0 for a leaf).
    pub fn depth(&self) -> usize {
        self.walk().map(|(_, depth)| depth).max().unwrap_or(0)
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.walk()
            .filter(|(node, _)| matches!(node, Self::Leaf { .. }))
            .count()
    }

    /// Number of nodes, leaves included.
    pub fn n_nodes(&self) -> usize {
        self.walk().count()
    }

    /// Pre-order traversal yielding each node with its depth.
    fn walk(&self) -> impl Iterator<Item = (&Self, usize)> {
        let mut stack = vec![(self, 0)];
        std::iter::from_fn(move || {
            let (node, depth) = stack.pop()?;
            if let Self::Split { left, right, .. } = node {
                stack.push((&**right, depth + 1));
                stack.push((&**left, depth + 1));
            }
            Some((node, depth))
        })
    }

    /// Human-readable `if`/`else` rendering of the tree.
    pub fn rules(&self) -> Rules<'_, L> {
        Rules { root: self }
    }
}

/// [`fmt::Display`] adapter returned by [`DecisionNode::rules`].
///
/// ```text
/// if row[1] <= 7.87
///     if row[3] <= 5.01
///         1
///     else
///         0
/// else
///     0
/// ```
pub struct Rules<'a, L> {
    root: &'a DecisionNode<L>,
}

const INDENT: &str = "    ";

enum Line<'a, L> {
    Node(&'a DecisionNode<L>, usize),
    Else(usize),
}

impl<L: fmt::Display> fmt::Display for Rules<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![Line::Node(self.root, 0)];
        while let Some(line) = stack.pop() {
            let (node, depth) = match line {
                Line::Else(depth) => {
                    writeln!(f, "{}else", INDENT.repeat(depth))?;
                    continue;
                }
                Line::Node(node, depth) => (node, depth),
            };
            let pad = INDENT.repeat(depth);
            match node {
                DecisionNode::Leaf { label } => writeln!(f, "{pad}{label}")?,
                DecisionNode::Split {
                    attribute,
                    threshold,
                    left,
                    right,
                } => {
                    writeln!(f, "{pad}if row[{attribute}] <= {threshold}")?;
                    stack.push(Line::Node(&**right, depth + 1));
                    stack.push(Line::Else(depth));
                    stack.push(Line::Node(&**left, depth + 1));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(label: &'static str) -> Box<DecisionNode<&'static str>> {
        Box::new(DecisionNode::Leaf { label })
    }

    fn sample() -> DecisionNode<&'static str> {
        DecisionNode::Split {
            attribute: 1,
            threshold: 7.87,
            left: Box::new(DecisionNode::Split {
                attribute: 3,
                threshold: 5.01,
                left: leaf("1"),
                right: leaf("0"),
            }),
            right: leaf("0"),
        }
    }

    #[test]
    fn test_classify() {
        let tree = sample();
        assert_eq!(*tree.classify(&[0.0, 7.87, 0.0, 5.0]).unwrap(), "1");
        assert_eq!(*tree.classify(&[0.0, 1.0, 0.0, 6.0]).unwrap(), "0");
        assert_eq!(*tree.classify(&[0.0, 9.0]).unwrap(), "0");
        assert!(matches!(
            tree.classify(&[0.0, 1.0]),
            Err(Error::DimensionMismatch {
                expected: 4,
                found: 2,
            })
        ));
    }

    #[test]
    fn test_shape() {
        let tree = sample();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 3);
        assert_eq!(tree.n_nodes(), 5);
    }

    #[test]
    fn test_rules() {
        let expected = "\
if row[1] <= 7.87
    if row[3] <= 5.01
        1
    else
        0
else
    0
";
        assert_eq!(sample().rules().to_string(), expected);
    }

    #[test]
    fn test_json_shape() {
        let tree: DecisionNode<u8> = DecisionNode::Split {
            attribute: 0,
            threshold: 1.5,
            left: Box::new(DecisionNode::Leaf { label: 0 }),
            right: Box::new(DecisionNode::Leaf { label: 1 }),
        };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["kind"], "split");
        assert_eq!(json["left"]["kind"], "leaf");
        assert_eq!(json["right"]["label"], 1);
        let back: DecisionNode<u8> = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }
}
