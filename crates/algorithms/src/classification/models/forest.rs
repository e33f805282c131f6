//! Random forest of CART trees
//!
//! Bagging over bootstrap samples with a random sqrt-sized feature subset
//! per tree; prediction is a majority vote. Tree seeds derive from the
//! master seed, so a fitted forest is reproducible.

use super::tree::{DecisionTree, TreeParams};
use super::{check_training_input, Classifier};
use crate::maybe_rayon::*;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use selvagis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for random-forest fitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees (default: 300)
    pub n_estimators: usize,
    /// Per-tree growth limits
    pub tree: TreeParams,
    /// Random seed for bootstrapping and feature subsets
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            tree: TreeParams::default(),
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
        }
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, features: &Array2<f64>, labels: &Array1<i32>) -> Result<()> {
        check_training_input(features, labels)?;
        if self.params.n_estimators == 0 {
            return Err(Error::InvalidParameter {
                name: "n_estimators",
                value: "0".to_string(),
                reason: "a forest needs at least one tree".to_string(),
            });
        }

        let n = features.nrows();
        let n_features = features.ncols();
        let subset_size = (n_features as f64).sqrt().ceil() as usize;
        let subset_size = subset_size.clamp(1, n_features);

        // Draw per-tree seeds up front so tree fitting can run in parallel
        let mut master = StdRng::seed_from_u64(self.params.seed);
        let seeds: Vec<u64> = (0..self.params.n_estimators)
            .map(|_| master.gen())
            .collect();

        self.trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);

                let bootstrap: Vec<usize> =
                    (0..n).map(|_| rng.gen_range(0..n)).collect();

                let mut feature_pool: Vec<usize> = (0..n_features).collect();
                feature_pool.shuffle(&mut rng);
                feature_pool.truncate(subset_size);
                feature_pool.sort_unstable();

                let mut tree = DecisionTree::new(self.params.tree.clone());
                tree.fit_indices(features, labels, &bootstrap, &feature_pool)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<i32>> {
        if self.trees.is_empty() {
            return Err(Error::NotFitted);
        }

        let mut out = Array1::zeros(features.nrows());
        for (i, row) in features.rows().into_iter().enumerate() {
            let row: Vec<f64> = row.iter().copied().collect();

            // Majority vote; ties break toward the smaller class code
            let mut votes: Vec<(i32, usize)> = Vec::new();
            for tree in &self.trees {
                let class = tree.classify_row(&row);
                match votes.iter_mut().find(|(c, _)| *c == class) {
                    Some((_, count)) => *count += 1,
                    None => votes.push((class, 1)),
                }
            }
            votes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            out[i] = votes[0].0;
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "random forest"
    }
}
