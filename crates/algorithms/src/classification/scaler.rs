//! Min-max feature scaling
//!
//! Fit once on the training split, applied unchanged to validation data
//! and unseen scenes. Inputs outside the fitted range extrapolate beyond
//! [0, 1] — expected when a scaler fit on one scene is applied to another.

use ndarray::Array2;
use selvagis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Per-column min/max bounds fitted from training features.
///
/// There is no refit operation: `fit` constructs, `transform` borrows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl MinMaxScaler {
    /// Compute per-column bounds from training features
    pub fn fit(features: &Array2<f64>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(Error::Pipeline(
                "cannot fit a scaler on zero samples".to_string(),
            ));
        }

        let cols = features.ncols();
        let mut min = vec![f64::INFINITY; cols];
        let mut max = vec![f64::NEG_INFINITY; cols];

        for row in features.rows() {
            for (j, &v) in row.iter().enumerate() {
                if v.is_nan() {
                    continue;
                }
                if v < min[j] {
                    min[j] = v;
                }
                if v > max[j] {
                    max[j] = v;
                }
            }
        }

        Ok(Self { min, max })
    }

    /// Number of feature columns the scaler was fitted on
    pub fn n_features(&self) -> usize {
        self.min.len()
    }

    /// Map each column linearly to [0, 1] using the fitted bounds.
    ///
    /// Constant columns map to 0. Values outside the fitted range produce
    /// values outside [0, 1].
    pub fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.n_features() {
            return Err(Error::SchemaMismatch(format!(
                "scaler fitted on {} columns, input has {}",
                self.n_features(),
                features.ncols()
            )));
        }

        let mut scaled = features.clone();
        for mut row in scaled.rows_mut() {
            for (j, v) in row.iter_mut().enumerate() {
                let range = self.max[j] - self.min[j];
                *v = if range.abs() < f64::EPSILON {
                    0.0
                } else {
                    (*v - self.min[j]) / range
                };
            }
        }
        Ok(scaled)
    }
}
