//! Reading and writing raster files

mod native;

pub use native::{read_raster, read_stack, write_raster};
