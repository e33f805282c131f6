//! # SelvaGis Core
//!
//! Core types and I/O for the SelvaGis land-cover analysis toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: Generic single-band raster grid
//! - `BandStack<T>`: Multi-band raster cube (band, row, col)
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling
//! - TIFF read/write for rasters and band stacks

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{BandStack, GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{BandStack, GeoTransform, Raster, RasterElement};
}
