//! Multi-band raster cube

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use ndarray::{s, Array3, ArrayView2};

/// A georeferenced stack of co-registered bands.
///
/// Data is stored as a 3D array in (band, row, col) order. All bands share
/// the same spatial grid and geo metadata, matching how multispectral scenes
/// are delivered.
#[derive(Debug, Clone)]
pub struct BandStack<T: RasterElement> {
    data: Array3<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> BandStack<T> {
    /// Create a stack from a (band, row, col) array
    pub fn from_array(data: Array3<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a stack from a flat vec in (band, row, col) order
    pub fn from_vec(data: Vec<T>, bands: usize, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != bands * rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array3::from_shape_vec((bands, rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Assemble a stack from single-band rasters of identical shape.
    ///
    /// Geo metadata is taken from the first band.
    pub fn from_bands(bands: Vec<Raster<T>>) -> Result<Self> {
        let first = bands.first().ok_or_else(|| {
            Error::Other("cannot build a band stack from zero bands".to_string())
        })?;
        let (rows, cols) = first.shape();
        let transform = *first.transform();
        let crs = first.crs().cloned();
        let nodata = first.nodata();

        let mut data = Array3::zeros((bands.len(), rows, cols));
        for (i, band) in bands.iter().enumerate() {
            if band.shape() != (rows, cols) {
                return Err(Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar: band.rows(),
                    ac: band.cols(),
                });
            }
            data.slice_mut(s![i, .., ..]).assign(band.data());
        }

        Ok(Self {
            data,
            transform,
            crs,
            nodata,
        })
    }

    // Dimensions

    /// Number of bands
    pub fn bands(&self) -> usize {
        self.data.dim().0
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.dim().1
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.dim().2
    }

    /// Dimensions as (bands, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of pixels in the spatial grid
    pub fn pixels(&self) -> usize {
        self.rows() * self.cols()
    }

    // Data access

    /// 2D view of one band
    pub fn band_view(&self, band: usize) -> Result<ArrayView2<'_, T>> {
        if band >= self.bands() {
            return Err(Error::BandOutOfRange {
                band,
                bands: self.bands(),
            });
        }
        Ok(self.data.slice(s![band, .., ..]))
    }

    /// Extract one band as a standalone raster carrying the stack's metadata
    pub fn band(&self, band: usize) -> Result<Raster<T>> {
        let view = self.band_view(band)?;
        let mut raster = Raster::from_array(view.to_owned());
        raster.set_transform(self.transform);
        raster.set_crs(self.crs.clone());
        raster.set_nodata(self.nodata);
        Ok(raster)
    }

    /// Get value at (band, row, col)
    pub fn get(&self, band: usize, row: usize, col: usize) -> Result<T> {
        self.data
            .get((band, row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (band, row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure all three indices are in range
    pub unsafe fn get_unchecked(&self, band: usize, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((band, row, col)) }
    }

    /// Per-pixel spectrum: the value of every band at (row, col)
    pub fn spectrum(&self, row: usize, col: usize) -> Result<Vec<T>> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(self.data.slice(s![.., row, col]).to_vec())
    }

    /// Reference to the underlying array
    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size in map units (the scene's spatial resolution)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }
}
