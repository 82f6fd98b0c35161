//! Split scoring: weighted Shannon entropy of a threshold split.

use std::collections::BTreeMap;

use crate::cluster::validate_rows;
use crate::error::{Error, Result};

/// A threshold split on one attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    /// Column the split tests.
    pub attribute: usize,
    /// Rows with `row[attribute] <= threshold` go left, the rest go right.
    pub threshold: f64,
    /// Weighted entropy of the split.
    pub entropy: f64,
}

/// Weighted entropy of splitting `features` on `attribute` at `threshold`.
///
/// Each side's entropy is weighted by its share of the records. A pure or empty
/// side contributes 0.
///
/// ```
/// use sift::tree::weighted_entropy;
///
/// let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
/// let labels = [0, 0, 1, 1];
/// assert_eq!(weighted_entropy(&features, &labels, 0, 2.0).unwrap(), 0.0);
/// assert_eq!(weighted_entropy(&features, &labels, 0, 4.0).unwrap(), 1.0);
/// ```
pub fn weighted_entropy<L: Ord>(
    features: &[Vec<f64>],
    labels: &[L],
    attribute: usize,
    threshold: f64,
) -> Result<f64> {
    let dim = validate_labeled(features, labels)?;
    check_attribute(attribute, dim)?;
    let rows: Vec<usize> = (0..features.len()).collect();
    Ok(split_entropy(features, labels, &rows, attribute, threshold))
}

/// The lowest-entropy split over every `(attribute, record value)` candidate.
///
/// Attributes are scanned in column order and, within an attribute, candidates in
/// row order; a later candidate only wins with strictly lower entropy. Thresholds
/// that would leave one side empty are skipped. Fails with
/// [`Error::NonSeparableData`] when no candidate remains (all rows identical).
pub fn best_split<L: Ord>(features: &[Vec<f64>], labels: &[L]) -> Result<Split> {
    let dim = validate_labeled(features, labels)?;
    let rows: Vec<usize> = (0..features.len()).collect();
    best_split_rows(features, labels, &rows, dim)
        .ok_or(Error::NonSeparableData { rows: rows.len() })
}

pub(crate) fn validate_labeled<L>(features: &[Vec<f64>], labels: &[L]) -> Result<usize> {
    let dim = validate_rows(features)?;
    if labels.len() != features.len() {
        return Err(Error::DimensionMismatch {
            expected: features.len(),
            found: labels.len(),
        });
    }
    Ok(dim)
}

fn check_attribute(attribute: usize, dim: usize) -> Result<()> {
    if attribute >= dim {
        return Err(Error::invalid(
            "attribute",
            format!("must be below {dim}, got {attribute}"),
        ));
    }
    Ok(())
}

pub(crate) fn best_split_rows<L: Ord>(
    features: &[Vec<f64>],
    labels: &[L],
    rows: &[usize],
    dim: usize,
) -> Option<Split> {
    let mut best: Option<Split> = None;
    for attribute in 0..dim {
        for &r in rows {
            let threshold = features[r][attribute];
            let left = rows
                .iter()
                .filter(|&&i| features[i][attribute] <= threshold)
                .count();
            if left == rows.len() {
                continue;
            }
            let entropy = split_entropy(features, labels, rows, attribute, threshold);
            if best.is_none_or(|b| entropy < b.entropy) {
                best = Some(Split {
                    attribute,
                    threshold,
                    entropy,
                });
            }
        }
    }
    best
}

fn split_entropy<L: Ord>(
    features: &[Vec<f64>],
    labels: &[L],
    rows: &[usize],
    attribute: usize,
    threshold: f64,
) -> f64 {
    let mut left: BTreeMap<&L, usize> = BTreeMap::new();
    let mut right: BTreeMap<&L, usize> = BTreeMap::new();
    for &r in rows {
        let side = if features[r][attribute] <= threshold {
            &mut left
        } else {
            &mut right
        };
        *side.entry(&labels[r]).or_default() += 1;
    }

    let total = rows.len() as f64;
    let weighted = |counts: &BTreeMap<&L, usize>| {
        let n: usize = counts.values().sum();
        n as f64 / total * entropy(counts.values().copied(), n)
    };
    weighted(&left) + weighted(&right)
}

/// Shannon entropy (bits) of a label histogram; 0 for an empty or pure histogram.
pub(crate) fn entropy(counts: impl Iterator<Item = usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / total;
            p * (1.0 / p).log2()
        })
        .sum()
}
