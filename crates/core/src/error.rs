//! Error types for SelvaGis

use thiserror::Error;

/// Main error type for SelvaGis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Band index {band} out of range for stack with {bands} bands")]
    BandOutOfRange { band: usize, bands: usize },

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Classifier has not been fitted")]
    NotFitted,

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for SelvaGis operations
pub type Result<T> = std::result::Result<T, Error>;
