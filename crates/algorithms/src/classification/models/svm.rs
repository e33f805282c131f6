//! Linear support-vector machine
//!
//! One-vs-rest linear SVMs trained with the Pegasos stochastic
//! subgradient method on the hinge loss. Multi-class prediction picks
//! the binary machine with the largest margin. The decision surface is
//! linear; features are expected to be scaled.

use super::{check_training_input, distinct_classes, Classifier};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use selvagis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for linear-SVM fitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmParams {
    /// Regularization strength lambda (default: 1e-3)
    pub lambda: f64,
    /// Stochastic subgradient steps per binary machine (default: 20000)
    pub iterations: usize,
    /// Seed for the sample-picking stream
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            lambda: 1e-3,
            iterations: 20_000,
            seed: 42,
        }
    }
}

/// One binary machine: weights, bias, and the class it separates
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySvm {
    class: i32,
    weights: Vec<f64>,
    bias: f64,
}

impl BinarySvm {
    fn margin(&self, row: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(row.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvm {
    params: SvmParams,
    machines: Vec<BinarySvm>,
}

impl LinearSvm {
    pub fn new(params: SvmParams) -> Self {
        Self {
            params,
            machines: Vec::new(),
        }
    }

    /// Pegasos on the hinge loss for one class against the rest
    fn fit_binary(
        &self,
        features: &Array2<f64>,
        labels: &Array1<i32>,
        class: i32,
        rng: &mut StdRng,
    ) -> BinarySvm {
        let n = features.nrows();
        let d = features.ncols();
        let mut weights = vec![0.0; d];
        let mut bias = 0.0;

        for t in 1..=self.params.iterations {
            let i = rng.gen_range(0..n);
            let y = if labels[i] == class { 1.0 } else { -1.0 };
            let row = features.row(i);

            let step = 1.0 / (self.params.lambda * t as f64);
            let margin = bias
                + weights
                    .iter()
                    .zip(row.iter())
                    .map(|(w, x)| w * x)
                    .sum::<f64>();

            // Shrink, then push along the violated sample
            let decay = 1.0 - step * self.params.lambda;
            for w in weights.iter_mut() {
                *w *= decay;
            }
            if y * margin < 1.0 {
                for (w, &x) in weights.iter_mut().zip(row.iter()) {
                    *w += step * y * x;
                }
                bias += step * y;
            }
        }

        BinarySvm {
            class,
            weights,
            bias,
        }
    }
}

impl Classifier for LinearSvm {
    fn fit(&mut self, features: &Array2<f64>, labels: &Array1<i32>) -> Result<()> {
        check_training_input(features, labels)?;
        if self.params.lambda <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "lambda",
                value: self.params.lambda.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let classes = distinct_classes(labels);
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        self.machines = classes
            .iter()
            .map(|&class| self.fit_binary(features, labels, class, &mut rng))
            .collect();
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<i32>> {
        if self.machines.is_empty() {
            return Err(Error::NotFitted);
        }

        let mut out = Array1::zeros(features.nrows());
        for (i, row) in features.rows().into_iter().enumerate() {
            let row: Vec<f64> = row.iter().copied().collect();

            let mut best_class = self.machines[0].class;
            let mut best_margin = f64::NEG_INFINITY;
            for machine in &self.machines {
                let m = machine.margin(&row);
                if m > best_margin {
                    best_margin = m;
                    best_class = machine.class;
                }
            }
            out[i] = best_class;
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "linear svm"
    }
}
