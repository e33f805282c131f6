//! Spectral vegetation indices
//!
//! Computed from single-band rasters (one band per raster). The training
//! pipeline uses the epsilon-stabilized NDVI; the generic normalized
//! difference and NBR serve the change-mapping workflow.

use crate::maybe_rayon::*;
use ndarray::Array2;
use selvagis_core::raster::Raster;
use selvagis_core::{Error, Result};

/// Additive denominator guard used by [`ndvi_eps`]
pub const NDVI_EPSILON: f64 = 1e-6;

/// Epsilon-stabilized Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red + eps)`
///
/// The small additive epsilon avoids division by zero on dark pixels, so
/// every finite input pixel gets a finite value. The result is nominally
/// in [-1, 1] but is not clamped. Nodata/NaN inputs yield NaN.
///
/// # Arguments
/// * `nir` - Near-infrared band
/// * `red` - Red band
/// * `eps` - Denominator guard (use [`NDVI_EPSILON`] for the default)
pub fn ndvi_eps(nir: &Raster<f64>, red: &Raster<f64>, eps: f64) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;

    let (rows, cols) = nir.shape();
    let nodata_nir = nir.nodata();
    let nodata_red = red.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };

                if is_nodata_f64(n, nodata_nir) || is_nodata_f64(r, nodata_red) {
                    continue;
                }

                row_data[col] = (n - r) / (n + r + eps);
            }
            row_data
        })
        .collect();

    build_output(nir, rows, cols, data)
}

/// Generic normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Result is in [-1, 1]. Pixels where the denominator vanishes or either
/// band is nodata are set to NaN.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let nodata_a = band_a.nodata();
    let nodata_b = band_b.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if is_nodata_f64(a, nodata_a) || is_nodata_f64(b, nodata_b) {
                    continue;
                }

                let sum = a + b;
                if sum.abs() < 1e-10 {
                    continue;
                }

                row_data[col] = (a - b) / sum;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Normalized Burn Ratio
///
/// `NBR = (NIR - SWIR) / (NIR + SWIR)`
///
/// Low values indicate burned or cleared areas; used alongside NDVI for
/// disturbance mapping.
pub fn nbr(nir: &Raster<f64>, swir: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, swir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_nodata_f64(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(nd) => (value - nd).abs() < f64::EPSILON,
        None => false,
    }
}

fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use selvagis_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn ndvi_equal_bands_is_near_zero() {
        let nir = make_band(4, 4, 0.3);
        let red = make_band(4, 4, 0.3);

        let result = ndvi_eps(&nir, &red, NDVI_EPSILON).unwrap();
        let val = result.get(1, 1).unwrap();

        assert!(val.abs() < 1e-5, "red = nir should give ~0, got {}", val);
    }

    #[test]
    fn ndvi_dense_vegetation_approaches_one() {
        let nir = make_band(4, 4, 0.9);
        let red = make_band(4, 4, 1e-9);

        let result = ndvi_eps(&nir, &red, NDVI_EPSILON).unwrap();
        let val = result.get(0, 0).unwrap();

        assert!(val > 0.99, "nir >> red should approach 1, got {}", val);
    }

    #[test]
    fn ndvi_bare_approaches_minus_one() {
        let nir = make_band(4, 4, 1e-9);
        let red = make_band(4, 4, 0.9);

        let result = ndvi_eps(&nir, &red, NDVI_EPSILON).unwrap();
        let val = result.get(0, 0).unwrap();

        assert!(val < -0.99, "red >> nir should approach -1, got {}", val);
    }

    #[test]
    fn ndvi_zero_bands_finite() {
        // The epsilon keeps all-zero pixels finite instead of NaN
        let nir = make_band(4, 4, 0.0);
        let red = make_band(4, 4, 0.0);

        let result = ndvi_eps(&nir, &red, NDVI_EPSILON).unwrap();
        let val = result.get(2, 2).unwrap();

        assert!(val.is_finite());
        assert!(val.abs() < 1e-12);
    }

    #[test]
    fn ndvi_nodata_propagates() {
        let mut nir = make_band(4, 4, 0.5);
        nir.set_nodata(Some(-9999.0));
        nir.set(1, 1, -9999.0).unwrap();
        let red = make_band(4, 4, 0.1);

        let result = ndvi_eps(&nir, &red, NDVI_EPSILON).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
        assert!(result.get(0, 0).unwrap().is_finite());
    }

    #[test]
    fn normalized_difference_value() {
        let a = make_band(3, 3, 0.8);
        let b = make_band(3, 3, 0.2);

        let result = normalized_difference(&a, &b).unwrap();
        assert_relative_eq!(result.get(1, 1).unwrap(), 0.6, epsilon = 1e-10);
    }

    #[test]
    fn normalized_difference_zero_sum_is_nan() {
        let a = make_band(3, 3, 0.0);
        let b = make_band(3, 3, 0.0);

        let result = normalized_difference(&a, &b).unwrap();
        assert!(result.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn nbr_burned_is_negative() {
        let nir = make_band(3, 3, 0.1);
        let swir = make_band(3, 3, 0.6);

        let result = nbr(&nir, &swir).unwrap();
        assert!(result.get(0, 0).unwrap() < 0.0);
    }

    #[test]
    fn dimension_mismatch_errors() {
        let a = make_band(3, 3, 1.0);
        let b = make_band(3, 5, 1.0);
        assert!(ndvi_eps(&a, &b, NDVI_EPSILON).is_err());
        assert!(normalized_difference(&a, &b).is_err());
    }
}
