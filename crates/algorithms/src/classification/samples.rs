//! Training-sample selection
//!
//! Flattens the spatial grid to a pixel table, keeps pixels that carry
//! ground truth and spectral coverage, and supports the paired
//! shuffle/cap/split sequence used before training. Every permutation is
//! applied identically to features and labels so row i in both always
//! refers to the same source pixel.

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use selvagis_core::{BandStack, Error, Raster, Result};

/// Paired per-pixel features and class labels
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub features: Array2<f64>,
    pub labels: Array1<i32>,
}

/// Pixels with any spectral signal: band sum > 0, in row-major order.
///
/// This is the original survey's cheap no-data proxy, not a general
/// validity test — a legitimately all-dark pixel is excluded too.
pub fn coverage_mask(stack: &BandStack<f64>) -> Vec<bool> {
    let (bands, rows, cols) = stack.shape();
    let mut mask = vec![false; rows * cols];

    for row in 0..rows {
        for col in 0..cols {
            let mut sum = 0.0;
            for band in 0..bands {
                sum += unsafe { stack.get_unchecked(band, row, col) };
            }
            // NaN sums fail the comparison and stay excluded
            mask[row * cols + col] = sum > 0.0;
        }
    }

    mask
}

impl SampleSet {
    /// Select training pixels from a feature matrix and a label grid.
    ///
    /// Pixel i (row-major) is kept iff its label is positive and its band
    /// sum is positive. Surviving rows keep their flatten order.
    pub fn select_labeled(
        features: &Array2<f64>,
        stack: &BandStack<f64>,
        labels: &Raster<i32>,
    ) -> Result<SampleSet> {
        let pixels = stack.pixels();
        if features.nrows() != pixels {
            return Err(Error::Pipeline(format!(
                "feature matrix has {} rows for {} pixels",
                features.nrows(),
                pixels
            )));
        }
        if labels.shape() != (stack.rows(), stack.cols()) {
            return Err(Error::SizeMismatch {
                er: stack.rows(),
                ec: stack.cols(),
                ar: labels.rows(),
                ac: labels.cols(),
            });
        }

        let coverage = coverage_mask(stack);
        let flat_labels: Vec<i32> = labels.data().iter().copied().collect();

        let keep: Vec<usize> = (0..pixels)
            .filter(|&i| flat_labels[i] > 0 && coverage[i])
            .collect();

        let selected = features.select(Axis(0), &keep);
        let selected_labels = Array1::from_iter(keep.iter().map(|&i| flat_labels[i]));

        Ok(SampleSet {
            features: selected,
            labels: selected_labels,
        })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sorted distinct class codes present in the labels
    pub fn class_codes(&self) -> Vec<i32> {
        let mut codes: Vec<i32> = self.labels.iter().copied().collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    /// Shuffle rows with one permutation applied to both arrays
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);

        self.features = self.features.select(Axis(0), &order);
        self.labels = Array1::from_iter(order.iter().map(|&i| self.labels[i]));
    }

    /// Keep at most `cap` rows (call after a shuffle for a random subsample)
    pub fn truncate(&mut self, cap: usize) {
        if self.len() <= cap {
            return;
        }
        self.features = self
            .features
            .slice_axis(Axis(0), ndarray::Slice::from(0..cap))
            .to_owned();
        self.labels = self
            .labels
            .slice_axis(Axis(0), ndarray::Slice::from(0..cap))
            .to_owned();
    }

    /// Split into (train, validation) by an independent index shuffle.
    ///
    /// `train_ratio` must be in (0, 1).
    pub fn split<R: Rng>(self, train_ratio: f64, rng: &mut R) -> Result<(SampleSet, SampleSet)> {
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(Error::InvalidParameter {
                name: "train_ratio",
                value: train_ratio.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }

        let n = self.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let cut = (train_ratio * n as f64) as usize;
        let (train_idx, val_idx) = order.split_at(cut);

        let take = |idx: &[usize]| SampleSet {
            features: self.features.select(Axis(0), idx),
            labels: Array1::from_iter(idx.iter().map(|&i| self.labels[i])),
        };

        Ok((take(train_idx), take(val_idx)))
    }
}
