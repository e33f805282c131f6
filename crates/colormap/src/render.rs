//! Raster-to-RGBA rendering and PNG export

use crate::scheme::{evaluate, ColorScheme, Rgb};
use image::RgbaImage;
use selvagis_core::{Error, Raster, RasterElement, Result};
use std::path::Path;

/// Parameters for colormap rendering
#[derive(Debug, Clone)]
pub struct ColormapParams {
    /// Color scheme to use
    pub scheme: ColorScheme,
    /// Minimum value for normalization; lower values clamp
    pub min: f64,
    /// Maximum value for normalization; higher values clamp
    pub max: f64,
    /// RGBA color for nodata pixels, transparent by default
    pub nodata_color: [u8; 4],
}

impl ColormapParams {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            scheme,
            min: 0.0,
            max: 1.0,
            nodata_color: [0, 0, 0, 0],
        }
    }

    pub fn with_range(scheme: ColorScheme, min: f64, max: f64) -> Self {
        Self {
            scheme,
            min,
            max,
            nodata_color: [0, 0, 0, 0],
        }
    }
}

/// Detect the value range of a raster and return ready-to-use params.
///
/// All-nodata rasters normalize over [0, 1]; constant rasters widen the
/// range by one so the single value lands at the ramp start.
pub fn auto_params<T: RasterElement>(raster: &Raster<T>, scheme: ColorScheme) -> ColormapParams {
    let nodata = raster.nodata();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for val in raster.data().iter() {
        if val.is_nodata(nodata) {
            continue;
        }
        if let Some(v) = val.to_f64() {
            if v.is_finite() {
                if v < min {
                    min = v;
                }
                if v > max {
                    max = v;
                }
            }
        }
    }

    if !min.is_finite() || !max.is_finite() {
        min = 0.0;
        max = 1.0;
    } else if (max - min).abs() < f64::EPSILON {
        max = min + 1.0;
    }

    ColormapParams::with_range(scheme, min, max)
}

/// Convert a raster to an RGBA buffer of length `rows * cols * 4`,
/// row-major. Nodata and non-finite pixels get `params.nodata_color`.
pub fn raster_to_rgba<T: RasterElement>(raster: &Raster<T>, params: &ColormapParams) -> Vec<u8> {
    let nodata = raster.nodata();
    let range = params.max - params.min;
    let inv_range = if range.abs() > f64::EPSILON {
        1.0 / range
    } else {
        1.0
    };

    let mut rgba = vec![0u8; raster.len() * 4];

    for (i, val) in raster.data().iter().enumerate() {
        let offset = i * 4;

        let value = if val.is_nodata(nodata) {
            None
        } else {
            val.to_f64().filter(|v| v.is_finite())
        };

        match value {
            Some(v) => {
                let t = (v - params.min) * inv_range;
                let Rgb { r, g, b } = evaluate(params.scheme, t);
                rgba[offset] = r;
                rgba[offset + 1] = g;
                rgba[offset + 2] = b;
                rgba[offset + 3] = 255;
            }
            None => {
                rgba[offset..offset + 4].copy_from_slice(&params.nodata_color);
            }
        }
    }

    rgba
}

/// Write an RGBA buffer as a PNG file
pub fn save_png(path: &Path, rgba: Vec<u8>, width: usize, height: usize) -> Result<()> {
    let image = RgbaImage::from_raw(width as u32, height as u32, rgba).ok_or_else(|| {
        Error::Other(format!(
            "RGBA buffer does not match {}x{} image",
            width, height
        ))
    })?;
    image
        .save(path)
        .map_err(|e| Error::Other(format!("PNG write failed: {}", e)))
}

/// Render a raster straight to a PNG with the given scheme and range
pub fn render_png<T: RasterElement>(
    raster: &Raster<T>,
    params: &ColormapParams,
    path: &Path,
) -> Result<()> {
    let rgba = raster_to_rgba(raster, params);
    save_png(path, rgba, raster.cols(), raster.rows())
}
