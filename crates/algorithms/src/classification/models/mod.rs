//! Classifier suite
//!
//! Five supervised models behind one `fit`/`predict` trait. All of them
//! train on a scaled `(samples, features)` matrix with integer class
//! labels and predict one code per row. Fitting is deterministic for a
//! fixed seed.

mod forest;
mod knn;
mod logistic;
mod svm;
mod tree;

pub use forest::{ForestParams, RandomForest};
pub use knn::{KNearest, KnnParams};
pub use logistic::{Logistic, LogisticParams};
pub use svm::{LinearSvm, SvmParams};
pub use tree::{DecisionTree, TreeParams};

use ndarray::{Array1, Array2};
use selvagis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Common interface for the supervised models
pub trait Classifier {
    /// Learn from scaled features and integer class labels
    fn fit(&mut self, features: &Array2<f64>, labels: &Array1<i32>) -> Result<()>;

    /// Predict one class code per feature row.
    ///
    /// Returns [`Error::NotFitted`] before a successful `fit`.
    fn predict(&self, features: &Array2<f64>) -> Result<Array1<i32>>;

    /// Short human-readable model name
    fn name(&self) -> &'static str;
}

/// Serializable wrapper over every supported classifier.
///
/// This is what gets embedded in the saved model artifact, so a loaded
/// model dispatches to the right implementation without trait objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnyClassifier {
    RandomForest(RandomForest),
    DecisionTree(DecisionTree),
    KNearest(KNearest),
    Logistic(Logistic),
    LinearSvm(LinearSvm),
}

impl AnyClassifier {
    /// Construct a classifier by its CLI-facing name
    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "rf" | "random-forest" => Ok(Self::RandomForest(RandomForest::new(
                ForestParams::default(),
            ))),
            "tree" | "decision-tree" => {
                Ok(Self::DecisionTree(DecisionTree::new(TreeParams::default())))
            }
            "knn" => Ok(Self::KNearest(KNearest::new(KnnParams::default()))),
            "logistic" => Ok(Self::Logistic(Logistic::new(LogisticParams::default()))),
            "svm" => Ok(Self::LinearSvm(LinearSvm::new(SvmParams::default()))),
            other => Err(Error::InvalidParameter {
                name: "classifier",
                value: other.to_string(),
                reason: "expected one of rf, tree, knn, logistic, svm".to_string(),
            }),
        }
    }

    /// One default-configured instance of every model, for comparisons
    pub fn default_suite() -> Vec<AnyClassifier> {
        vec![
            Self::LinearSvm(LinearSvm::new(SvmParams::default())),
            Self::KNearest(KNearest::new(KnnParams::default())),
            Self::Logistic(Logistic::new(LogisticParams::default())),
            Self::RandomForest(RandomForest::new(ForestParams::default())),
            Self::DecisionTree(DecisionTree::new(TreeParams::default())),
        ]
    }
}

impl Classifier for AnyClassifier {
    fn fit(&mut self, features: &Array2<f64>, labels: &Array1<i32>) -> Result<()> {
        match self {
            Self::RandomForest(m) => m.fit(features, labels),
            Self::DecisionTree(m) => m.fit(features, labels),
            Self::KNearest(m) => m.fit(features, labels),
            Self::Logistic(m) => m.fit(features, labels),
            Self::LinearSvm(m) => m.fit(features, labels),
        }
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<i32>> {
        match self {
            Self::RandomForest(m) => m.predict(features),
            Self::DecisionTree(m) => m.predict(features),
            Self::KNearest(m) => m.predict(features),
            Self::Logistic(m) => m.predict(features),
            Self::LinearSvm(m) => m.predict(features),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::RandomForest(m) => m.name(),
            Self::DecisionTree(m) => m.name(),
            Self::KNearest(m) => m.name(),
            Self::Logistic(m) => m.name(),
            Self::LinearSvm(m) => m.name(),
        }
    }
}

/// Shared input validation for `fit` implementations
pub(crate) fn check_training_input(features: &Array2<f64>, labels: &Array1<i32>) -> Result<()> {
    if features.nrows() == 0 {
        return Err(Error::Pipeline("cannot fit on zero samples".to_string()));
    }
    if features.nrows() != labels.len() {
        return Err(Error::Pipeline(format!(
            "{} feature rows but {} labels",
            features.nrows(),
            labels.len()
        )));
    }
    Ok(())
}

/// Sorted distinct class codes in a label vector
pub(crate) fn distinct_classes(labels: &Array1<i32>) -> Vec<i32> {
    let mut codes: Vec<i32> = labels.iter().copied().collect();
    codes.sort_unstable();
    codes.dedup();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Two well-separated clusters, labels 1 and 2
    fn two_blob_data() -> (Array2<f64>, Array1<i32>) {
        let features = array![
            [0.0, 0.1],
            [0.1, 0.0],
            [0.05, 0.05],
            [0.1, 0.1],
            [0.9, 1.0],
            [1.0, 0.9],
            [0.95, 0.95],
            [0.9, 0.9],
        ];
        let labels = array![1, 1, 1, 1, 2, 2, 2, 2];
        (features, labels)
    }

    #[test]
    fn suite_trains_and_separates_blobs() {
        let (x, y) = two_blob_data();
        let probe = array![[0.02, 0.02], [0.97, 0.93]];

        for mut model in AnyClassifier::default_suite() {
            model.fit(&x, &y).unwrap();
            let pred = model.predict(&probe).unwrap();
            assert_eq!(pred[0], 1, "{} misclassified the low blob", model.name());
            assert_eq!(pred[1], 2, "{} misclassified the high blob", model.name());
        }
    }

    #[test]
    fn predict_before_fit_errors() {
        let probe = array![[0.5, 0.5]];
        for model in AnyClassifier::default_suite() {
            assert!(
                model.predict(&probe).is_err(),
                "{} predicted without fitting",
                model.name()
            );
        }
    }

    #[test]
    fn by_name_resolves_aliases() {
        assert!(matches!(
            AnyClassifier::by_name("rf").unwrap(),
            AnyClassifier::RandomForest(_)
        ));
        assert!(matches!(
            AnyClassifier::by_name("decision-tree").unwrap(),
            AnyClassifier::DecisionTree(_)
        ));
        assert!(AnyClassifier::by_name("mlp").is_err());
    }

    #[test]
    fn mismatched_training_input_rejected() {
        let (x, _) = two_blob_data();
        let short = array![1, 2];
        let mut model = AnyClassifier::by_name("tree").unwrap();
        assert!(model.fit(&x, &short).is_err());
    }
}
