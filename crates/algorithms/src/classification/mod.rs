//! Supervised pixel-classification pipeline
//!
//! The stages, in training order:
//! - **features**: versioned feature schema (raw bands + NDVI column) and
//!   feature-matrix construction in row-major pixel order
//! - **samples**: labeled-pixel selection, paired shuffling, capping and
//!   train/validation splitting
//! - **scaler**: min-max normalization, fit once on the training split
//! - **models**: the classifier suite behind one `fit`/`predict` trait
//! - **metrics**: accuracy, per-class report, confusion matrix
//! - **mapper**: full-image prediction and the persisted model artifact

mod features;
mod mapper;
mod metrics;
pub mod models;
mod samples;
mod scaler;

pub use features::{ColumnSource, FeatureColumn, FeatureSchema, SCHEMA_VERSION};
pub use mapper::{TrainedModel, UNCLASSIFIED};
pub use metrics::{accuracy, confusion_matrix, ClassMetrics, ClassificationReport};
pub use models::{
    AnyClassifier, Classifier, DecisionTree, ForestParams, KNearest, KnnParams, LinearSvm,
    Logistic, LogisticParams, RandomForest, SvmParams, TreeParams,
};
pub use samples::{coverage_mask, SampleSet};
pub use scaler::MinMaxScaler;
