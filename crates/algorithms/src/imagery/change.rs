//! Vegetation-loss change mapping
//!
//! Compares a vegetation index computed for two temporally separated
//! captures of the same scene and flags pixels whose index dropped by
//! more than a configurable threshold.

use crate::maybe_rayon::*;
use ndarray::Array2;
use selvagis_core::raster::Raster;
use selvagis_core::{Error, Result};

/// Parameters for vegetation-loss detection
#[derive(Debug, Clone)]
pub struct ChangeParams {
    /// Index decrease beyond which a pixel counts as vegetation loss.
    /// The comparison is strict: a drop of exactly this value is not
    /// flagged. Default: 0.2.
    pub loss_threshold: f64,
}

impl Default for ChangeParams {
    fn default() -> Self {
        Self {
            loss_threshold: 0.2,
        }
    }
}

/// Aggregate counts from a change-mapping run
#[derive(Debug, Clone, Copy)]
pub struct ChangeSummary {
    /// All pixels in the grid, valid or not
    pub total_pixels: usize,
    /// Pixels flagged as vegetation loss
    pub flagged_pixels: usize,
}

impl ChangeSummary {
    /// Flagged share of the full grid, in [0, 1]
    pub fn fraction(&self) -> f64 {
        if self.total_pixels == 0 {
            return 0.0;
        }
        self.flagged_pixels as f64 / self.total_pixels as f64
    }

    /// Flagged share of the full grid, as a percentage
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }
}

/// Flag pixels whose vegetation index dropped between two dates.
///
/// A pixel is flagged iff `(before - after) > loss_threshold`. Pixels where
/// either index is NaN are never flagged. The summary counts flagged pixels
/// against the whole grid.
///
/// # Arguments
/// * `before` - Vegetation index at time T1
/// * `after` - Vegetation index at time T2
/// * `params` - Threshold parameters
///
/// # Returns
/// Tuple of (loss mask raster with 1 = loss / 0 = no loss, summary)
pub fn vegetation_loss(
    before: &Raster<f64>,
    after: &Raster<f64>,
    params: ChangeParams,
) -> Result<(Raster<u8>, ChangeSummary)> {
    let (rows, cols) = before.shape();
    if after.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: after.rows(),
            ac: after.cols(),
        });
    }

    let threshold = params.loss_threshold;

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for col in 0..cols {
                let b = unsafe { before.get_unchecked(row, col) };
                let a = unsafe { after.get_unchecked(row, col) };

                if b.is_nan() || a.is_nan() {
                    continue;
                }
                if (b - a) > threshold {
                    row_data[col] = 1;
                }
            }
            row_data
        })
        .collect();

    let flagged = data.iter().filter(|&&v| v == 1).count();

    let mut mask = before.with_same_meta::<u8>(rows, cols);
    *mask.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok((
        mask,
        ChangeSummary {
            total_pixels: rows * cols,
            flagged_pixels: flagged,
        },
    ))
}

/// Signed index change: `after - before`.
///
/// Negative values are vegetation loss, positive values gain. NaN in either
/// input propagates to the output.
pub fn index_difference(before: &Raster<f64>, after: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = before.shape();
    if after.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: after.rows(),
            ac: after.cols(),
        });
    }

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let b = unsafe { before.get_unchecked(row, col) };
                let a = unsafe { after.get_unchecked(row, col) };
                if !b.is_nan() && !a.is_nan() {
                    row_data[col] = a - b;
                }
            }
            row_data
        })
        .collect();

    let mut diff = before.with_same_meta::<f64>(rows, cols);
    diff.set_nodata(Some(f64::NAN));
    *diff.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use selvagis_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn drop_of_exactly_threshold_is_not_flagged() {
        let before = make_band(3, 3, 0.7);
        let mut after = make_band(3, 3, 0.7);
        after.set(1, 1, 0.5).unwrap(); // drop of exactly 0.2

        let (mask, summary) = vegetation_loss(&before, &after, ChangeParams::default()).unwrap();
        assert_eq!(mask.get(1, 1).unwrap(), 0);
        assert_eq!(summary.flagged_pixels, 0);
    }

    #[test]
    fn drop_just_over_threshold_is_flagged() {
        let before = make_band(3, 3, 0.7);
        let mut after = make_band(3, 3, 0.7);
        after.set(1, 1, 0.7 - 0.2000001).unwrap();

        let (mask, summary) = vegetation_loss(&before, &after, ChangeParams::default()).unwrap();
        assert_eq!(mask.get(1, 1).unwrap(), 1);
        assert_eq!(summary.flagged_pixels, 1);
        assert_eq!(summary.total_pixels, 9);
        assert!((summary.percent() - 100.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn nan_pixels_are_never_flagged() {
        let mut before = make_band(2, 2, 0.9);
        before.set(0, 0, f64::NAN).unwrap();
        let after = make_band(2, 2, 0.1);

        let (mask, summary) = vegetation_loss(&before, &after, ChangeParams::default()).unwrap();
        assert_eq!(mask.get(0, 0).unwrap(), 0);
        assert_eq!(summary.flagged_pixels, 3);
    }

    #[test]
    fn custom_threshold() {
        let before = make_band(2, 2, 0.5);
        let after = make_band(2, 2, 0.45);

        let params = ChangeParams {
            loss_threshold: 0.01,
        };
        let (_, summary) = vegetation_loss(&before, &after, params).unwrap();
        assert_eq!(summary.flagged_pixels, 4);
        assert!((summary.fraction() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn difference_sign() {
        let before = make_band(2, 2, 0.6);
        let after = make_band(2, 2, 0.4);

        let diff = index_difference(&before, &after).unwrap();
        assert!((diff.get(0, 0).unwrap() + 0.2).abs() < 1e-12);
    }

    #[test]
    fn shape_mismatch_errors() {
        let before = make_band(2, 2, 0.5);
        let after = make_band(2, 3, 0.5);
        assert!(vegetation_loss(&before, &after, ChangeParams::default()).is_err());
        assert!(index_difference(&before, &after).is_err());
    }
}
