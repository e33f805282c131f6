//! Multinomial logistic regression
//!
//! Softmax over one weight vector per class, trained by full-batch
//! gradient descent with L2 regularization. Features are expected to be
//! scaled; the learning-rate default assumes roughly unit-range inputs.

use super::{check_training_input, distinct_classes, Classifier};
use ndarray::{Array1, Array2, Axis};
use selvagis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for logistic-regression fitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Gradient-descent step size (default: 0.1)
    pub learning_rate: f64,
    /// Full-batch iterations (default: 500)
    pub max_iterations: usize,
    /// L2 penalty on the weights, bias excluded (default: 1e-4)
    pub l2: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iterations: 500,
            l2: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logistic {
    params: LogisticParams,
    /// (classes, features) weight matrix
    weights: Option<Array2<f64>>,
    /// One bias per class
    biases: Option<Array1<f64>>,
    classes: Vec<i32>,
}

impl Logistic {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            weights: None,
            biases: None,
            classes: Vec::new(),
        }
    }

    /// Per-class scores for one feature row
    fn scores(&self, weights: &Array2<f64>, biases: &Array1<f64>, row: &[f64]) -> Vec<f64> {
        (0..self.classes.len())
            .map(|c| {
                let w = weights.row(c);
                biases[c] + w.iter().zip(row.iter()).map(|(a, b)| a * b).sum::<f64>()
            })
            .collect()
    }
}

/// Numerically stable softmax in place
fn softmax(scores: &mut [f64]) {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        total += *s;
    }
    for s in scores.iter_mut() {
        *s /= total;
    }
}

impl Classifier for Logistic {
    fn fit(&mut self, features: &Array2<f64>, labels: &Array1<i32>) -> Result<()> {
        check_training_input(features, labels)?;

        self.classes = distinct_classes(labels);
        let n_classes = self.classes.len();
        let n_features = features.ncols();
        let n = features.nrows();

        let class_index: Vec<usize> = labels
            .iter()
            .map(|l| {
                self.classes
                    .iter()
                    .position(|c| c == l)
                    .unwrap_or(0)
            })
            .collect();

        let mut weights = Array2::<f64>::zeros((n_classes, n_features));
        let mut biases = Array1::<f64>::zeros(n_classes);

        for _iter in 0..self.params.max_iterations {
            let mut grad_w = Array2::<f64>::zeros((n_classes, n_features));
            let mut grad_b = Array1::<f64>::zeros(n_classes);

            for (i, row) in features.rows().into_iter().enumerate() {
                let row: Vec<f64> = row.iter().copied().collect();
                let mut probs = self.scores(&weights, &biases, &row);
                softmax(&mut probs);

                for c in 0..n_classes {
                    let target = if class_index[i] == c { 1.0 } else { 0.0 };
                    let delta = probs[c] - target;
                    grad_b[c] += delta;
                    for (j, &v) in row.iter().enumerate() {
                        grad_w[(c, j)] += delta * v;
                    }
                }
            }

            let scale = self.params.learning_rate / n as f64;
            grad_w.mapv_inplace(|g| g * scale);
            grad_b.mapv_inplace(|g| g * scale);

            // L2 shrinkage on weights only
            weights.mapv_inplace(|w| w * (1.0 - self.params.learning_rate * self.params.l2));
            weights -= &grad_w;
            biases -= &grad_b;
        }

        self.weights = Some(weights);
        self.biases = Some(biases);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<i32>> {
        let (weights, biases) = match (&self.weights, &self.biases) {
            (Some(w), Some(b)) => (w, b),
            _ => return Err(Error::NotFitted),
        };

        let mut out = Array1::zeros(features.nrows());
        for (i, row) in features.axis_iter(Axis(0)).enumerate() {
            let row: Vec<f64> = row.iter().copied().collect();
            let scores = self.scores(weights, biases, &row);

            let mut best = 0;
            for (c, &s) in scores.iter().enumerate() {
                if s > scores[best] {
                    best = c;
                }
            }
            out[i] = self.classes[best];
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "logistic regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn separates_two_classes() {
        let x = array![[0.0], [0.1], [0.2], [0.8], [0.9], [1.0]];
        let y = array![1, 1, 1, 2, 2, 2];

        let mut model = Logistic::new(LogisticParams::default());
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&array![[0.05], [0.95]]).unwrap();
        assert_eq!(pred.to_vec(), vec![1, 2]);
    }

    #[test]
    fn handles_three_classes() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [1.0, 0.0],
            [0.9, 0.1],
            [0.0, 1.0],
            [0.1, 0.9],
        ];
        let y = array![1, 1, 2, 2, 3, 3];

        let mut model = Logistic::new(LogisticParams {
            max_iterations: 2000,
            ..LogisticParams::default()
        });
        model.fit(&x, &y).unwrap();

        let pred = model
            .predict(&array![[0.05, 0.05], [0.95, 0.05], [0.05, 0.95]])
            .unwrap();
        assert_eq!(pred.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn softmax_sums_to_one() {
        let mut scores = vec![1.0, 2.0, 3.0];
        softmax(&mut scores);
        let total: f64 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(scores[2] > scores[1] && scores[1] > scores[0]);
    }

    #[test]
    fn unfitted_model_errors() {
        let model = Logistic::new(LogisticParams::default());
        assert!(model.predict(&array![[0.0]]).is_err());
    }
}
