//! # SelvaGis Algorithms
//!
//! Analysis algorithms for the SelvaGis land-cover toolkit.
//!
//! ## Categories
//!
//! - **imagery**: spectral indices (NDVI, NBR) and vegetation-loss change mapping
//! - **classification**: the supervised pixel-classification pipeline —
//!   feature schema, sample selection, min-max scaling, classifier suite,
//!   evaluation metrics and full-image prediction

pub mod classification;
pub mod imagery;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{
        accuracy, confusion_matrix, AnyClassifier, ClassificationReport, Classifier,
        FeatureSchema, MinMaxScaler, SampleSet, TrainedModel,
    };
    pub use crate::imagery::{
        index_difference, ndvi_eps, normalized_difference, vegetation_loss, ChangeParams,
        ChangeSummary,
    };
    pub use selvagis_core::prelude::*;
}
