//! CART decision tree with Gini impurity
//!
//! Nodes live in a flat arena indexed by `usize`, which keeps the tree
//! serializable and avoids recursive ownership. Splits are axis-aligned
//! thresholds chosen greedily; candidate thresholds are midpoints between
//! consecutive distinct sorted feature values.

use super::{check_training_input, distinct_classes, Classifier};
use ndarray::{Array1, Array2};
use selvagis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for decision-tree fitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum tree depth, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Smallest node that may still be split (default: 2)
    pub min_samples_split: usize,
    /// Smallest allowed leaf (default: 1)
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Node {
    Leaf {
        class: i32,
    },
    Split {
        feature: usize,
        threshold: f64,
        /// Arena index of the subtree for `value <= threshold`
        left: usize,
        /// Arena index of the subtree for `value > threshold`
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    params: TreeParams,
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
        }
    }

    /// Walk one feature row from the root to its leaf class.
    ///
    /// Must not be called on an unfitted tree.
    pub(crate) fn classify_row(&self, row: &[f64]) -> i32 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Grow the tree from the given sample indices; used directly by the
    /// forest so each tree can train on its own bootstrap and feature set.
    pub(crate) fn fit_indices(
        &mut self,
        features: &Array2<f64>,
        labels: &Array1<i32>,
        indices: &[usize],
        allowed_features: &[usize],
    ) -> Result<()> {
        if indices.is_empty() {
            return Err(Error::Pipeline("cannot fit on zero samples".to_string()));
        }
        self.nodes.clear();
        self.grow(features, labels, indices.to_vec(), allowed_features, 0);
        Ok(())
    }

    /// Recursively build a subtree, returning its arena index
    fn grow(
        &mut self,
        features: &Array2<f64>,
        labels: &Array1<i32>,
        indices: Vec<usize>,
        allowed_features: &[usize],
        depth: usize,
    ) -> usize {
        let majority = majority_class(labels, &indices);

        let depth_exhausted = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_exhausted
            || indices.len() < self.params.min_samples_split
            || is_pure(labels, &indices)
        {
            return self.push(Node::Leaf { class: majority });
        }

        let Some((feature, threshold)) = best_split(
            features,
            labels,
            &indices,
            allowed_features,
            self.params.min_samples_leaf,
        ) else {
            return self.push(Node::Leaf { class: majority });
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| features[(i, feature)] <= threshold);

        // Reserve the split slot before growing children
        let at = self.push(Node::Leaf { class: majority });
        let left = self.grow(features, labels, left_idx, allowed_features, depth + 1);
        let right = self.grow(features, labels, right_idx, allowed_features, depth + 1);
        self.nodes[at] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        at
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, features: &Array2<f64>, labels: &Array1<i32>) -> Result<()> {
        check_training_input(features, labels)?;
        let all: Vec<usize> = (0..features.nrows()).collect();
        let all_features: Vec<usize> = (0..features.ncols()).collect();
        self.fit_indices(features, labels, &all, &all_features)
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<i32>> {
        if self.nodes.is_empty() {
            return Err(Error::NotFitted);
        }
        let mut out = Array1::zeros(features.nrows());
        for (i, row) in features.rows().into_iter().enumerate() {
            let row: Vec<f64> = row.iter().copied().collect();
            out[i] = self.classify_row(&row);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "decision tree"
    }
}

fn is_pure(labels: &Array1<i32>, indices: &[usize]) -> bool {
    let first = labels[indices[0]];
    indices.iter().all(|&i| labels[i] == first)
}

fn majority_class(labels: &Array1<i32>, indices: &[usize]) -> i32 {
    let codes = distinct_classes(&Array1::from_iter(indices.iter().map(|&i| labels[i])));
    let mut best = codes[0];
    let mut best_count = 0;
    for &code in &codes {
        let count = indices.iter().filter(|&&i| labels[i] == code).count();
        if count > best_count {
            best_count = count;
            best = code;
        }
    }
    best
}

/// Gini impurity of the class counts in `counts`
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let mut sum_sq = 0.0;
    for &c in counts {
        let p = c as f64 / total as f64;
        sum_sq += p * p;
    }
    1.0 - sum_sq
}

/// Best (feature, threshold) over the allowed features, by weighted Gini.
///
/// Returns `None` when no split satisfies the leaf-size floor or reduces
/// impurity.
fn best_split(
    features: &Array2<f64>,
    labels: &Array1<i32>,
    indices: &[usize],
    allowed_features: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let codes = distinct_classes(&Array1::from_iter(indices.iter().map(|&i| labels[i])));
    let class_of = |i: usize| codes.iter().position(|&c| c == labels[i]).unwrap_or(0);

    let n = indices.len();
    let mut parent_counts = vec![0usize; codes.len()];
    for &i in indices {
        parent_counts[class_of(i)] += 1;
    }
    let parent_gini = gini(&parent_counts, n);

    let mut best: Option<(usize, f64, f64)> = None;

    for &feature in allowed_features {
        // Sort sample indices by this feature once, then sweep thresholds
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            features[(a, feature)]
                .partial_cmp(&features[(b, feature)])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_counts = vec![0usize; codes.len()];
        let mut right_counts = parent_counts.clone();

        for split_at in 1..n {
            let moved = order[split_at - 1];
            left_counts[class_of(moved)] += 1;
            right_counts[class_of(moved)] -= 1;

            let lo = features[(order[split_at - 1], feature)];
            let hi = features[(order[split_at], feature)];
            if lo == hi {
                continue; // no threshold separates equal values
            }
            if split_at < min_leaf || n - split_at < min_leaf {
                continue;
            }

            let weighted = (split_at as f64 * gini(&left_counts, split_at)
                + (n - split_at) as f64 * gini(&right_counts, n - split_at))
                / n as f64;

            if weighted < parent_gini - 1e-12
                && best.map_or(true, |(_, _, g)| weighted < g)
            {
                best = Some((feature, (lo + hi) / 2.0, weighted));
            }
        }
    }

    best.map(|(f, t, _)| (f, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn learns_a_single_threshold() {
        let x = array![[0.0], [0.2], [0.8], [1.0]];
        let y = array![1, 1, 2, 2];

        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();

        let pred = tree.predict(&array![[0.1], [0.9]]).unwrap();
        assert_eq!(pred.to_vec(), vec![1, 2]);
    }

    #[test]
    fn fits_training_data_exactly_when_separable() {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [1.0, 1.0],
        ];
        let y = array![1, 2, 3, 4];

        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap().to_vec(), y.to_vec());
    }

    #[test]
    fn max_depth_limits_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1, 2, 3, 4];

        let mut stump = DecisionTree::new(TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        });
        stump.fit(&x, &y).unwrap();

        // Depth 1 allows one split, so at most two distinct predictions
        let pred = stump.predict(&x).unwrap();
        let distinct = distinct_classes(&pred);
        assert!(distinct.len() <= 2, "stump produced {:?}", distinct);
    }

    #[test]
    fn constant_features_fall_back_to_majority() {
        let x = array![[0.5], [0.5], [0.5]];
        let y = array![1, 2, 2];

        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&array![[0.5]]).unwrap()[0], 2);
    }

    #[test]
    fn unfitted_tree_errors() {
        let tree = DecisionTree::new(TreeParams::default());
        assert!(matches!(
            tree.predict(&array![[0.0]]),
            Err(Error::NotFitted)
        ));
    }
}
