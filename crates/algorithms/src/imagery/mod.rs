//! Imagery analysis
//!
//! Spectral indices and temporal change mapping:
//! - NDVI (epsilon-stabilized, the training pipeline's vegetation feature)
//! - Generic normalized difference and NBR
//! - Vegetation-loss detection between two dates

mod change;
mod indices;

pub use change::{index_difference, vegetation_loss, ChangeParams, ChangeSummary};
pub use indices::{nbr, ndvi_eps, normalized_difference, NDVI_EPSILON};
