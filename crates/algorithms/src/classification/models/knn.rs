//! K-nearest-neighbours classifier
//!
//! Brute-force Euclidean search over the stored training set with uniform
//! voting; vote ties fall to the class with the closest neighbour. Memory
//! scales with the training data, which the sampling cap upstream keeps
//! bounded.

use super::{check_training_input, Classifier};
use crate::maybe_rayon::*;
use ndarray::{Array1, Array2};
use selvagis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for k-NN classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnParams {
    /// Number of neighbours to vote (default: 10)
    pub k: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self { k: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNearest {
    params: KnnParams,
    train_features: Option<Array2<f64>>,
    train_labels: Option<Array1<i32>>,
}

impl KNearest {
    pub fn new(params: KnnParams) -> Self {
        Self {
            params,
            train_features: None,
            train_labels: None,
        }
    }
}

impl Classifier for KNearest {
    fn fit(&mut self, features: &Array2<f64>, labels: &Array1<i32>) -> Result<()> {
        check_training_input(features, labels)?;
        if self.params.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                value: "0".to_string(),
                reason: "at least one neighbour is required".to_string(),
            });
        }
        self.train_features = Some(features.clone());
        self.train_labels = Some(labels.clone());
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<i32>> {
        let (train, labels) = match (&self.train_features, &self.train_labels) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(Error::NotFitted),
        };
        let k = self.params.k.min(train.nrows());

        let rows: Vec<usize> = (0..features.nrows()).collect();
        let predictions: Vec<i32> = rows
            .into_par_iter()
            .map(|i| {
                let query = features.row(i);

                // Squared distances preserve neighbour order
                let mut dists: Vec<(f64, i32)> = train
                    .rows()
                    .into_iter()
                    .zip(labels.iter())
                    .map(|(row, &label)| {
                        let d: f64 = row
                            .iter()
                            .zip(query.iter())
                            .map(|(a, b)| (a - b) * (a - b))
                            .sum();
                        (d, label)
                    })
                    .collect();
                dists.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                // dists is sorted, so the first vote per class records its
                // nearest neighbour; count ties go to the closest class
                let mut votes: Vec<(i32, usize, f64)> = Vec::new();
                for &(d, label) in dists.iter().take(k) {
                    match votes.iter_mut().find(|(c, _, _)| *c == label) {
                        Some((_, count, _)) => *count += 1,
                        None => votes.push((label, 1, d)),
                    }
                }
                votes.sort_by(|a, b| {
                    b.1.cmp(&a.1)
                        .then(a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
                        .then(a.0.cmp(&b.0))
                });
                votes[0].0
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn name(&self) -> &'static str {
        "k-nearest neighbours"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nearest_neighbour_wins() {
        let x = array![[0.0], [0.1], [0.9], [1.0]];
        let y = array![1, 1, 2, 2];

        let mut knn = KNearest::new(KnnParams { k: 1 });
        knn.fit(&x, &y).unwrap();

        let pred = knn.predict(&array![[0.05], [0.95]]).unwrap();
        assert_eq!(pred.to_vec(), vec![1, 2]);
    }

    #[test]
    fn k_larger_than_training_set_is_clamped() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![1, 1, 2];

        let mut knn = KNearest::new(KnnParams { k: 50 });
        knn.fit(&x, &y).unwrap();

        // All three samples vote; majority is class 1
        assert_eq!(knn.predict(&array![[1.5]]).unwrap()[0], 1);
    }

    #[test]
    fn uniform_vote_over_k() {
        let x = array![[0.0], [0.2], [0.4], [3.0]];
        let y = array![1, 1, 2, 2];

        let mut knn = KNearest::new(KnnParams { k: 3 });
        knn.fit(&x, &y).unwrap();

        // Neighbours of 0.1 within k=3 are labels {1, 1, 2}
        assert_eq!(knn.predict(&array![[0.1]]).unwrap()[0], 1);
    }

    #[test]
    fn vote_tie_goes_to_closest_class() {
        let x = array![[0.0], [1.0]];
        let y = array![1, 2];

        let mut knn = KNearest::new(KnnParams { k: 2 });
        knn.fit(&x, &y).unwrap();

        // Both classes get one vote; the nearer neighbour decides
        let pred = knn.predict(&array![[0.9], [0.1]]).unwrap();
        assert_eq!(pred.to_vec(), vec![2, 1]);
    }

    #[test]
    fn clamped_k_still_separates_balanced_classes() {
        // k larger than the training set degenerates to a full-set vote;
        // with balanced classes the nearest neighbour must break the tie
        let x = array![[0.0, 0.0], [0.1, 0.1], [0.9, 0.9], [1.0, 1.0]];
        let y = array![1, 1, 2, 2];

        let mut knn = KNearest::new(KnnParams { k: 10 });
        knn.fit(&x, &y).unwrap();

        let pred = knn.predict(&array![[0.05, 0.05], [0.95, 0.95]]).unwrap();
        assert_eq!(pred.to_vec(), vec![1, 2]);
    }

    #[test]
    fn zero_k_rejected() {
        let x = array![[0.0]];
        let y = array![1];
        let mut knn = KNearest::new(KnnParams { k: 0 });
        assert!(knn.fit(&x, &y).is_err());
    }

    #[test]
    fn unfitted_knn_errors() {
        let knn = KNearest::new(KnnParams::default());
        assert!(matches!(
            knn.predict(&array![[0.0]]),
            Err(Error::NotFitted)
        ));
    }
}
