//! Full-image prediction and the persisted model artifact
//!
//! A trained model bundles the exact feature schema and scaler it was
//! fitted with, so a classified map produced months later from the saved
//! artifact goes through the identical preprocessing.

use super::features::FeatureSchema;
use super::models::{AnyClassifier, Classifier};
use super::samples::coverage_mask;
use super::scaler::MinMaxScaler;
use ndarray::{Array1, Array2, Axis};
use selvagis_core::{BandStack, Error, Raster, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Class code written for pixels excluded from prediction
pub const UNCLASSIFIED: i32 = -1;

/// A fitted classifier together with its preprocessing state.
///
/// Serialized as JSON; [`TrainedModel::load`] rejects artifacts whose
/// schema version the running build does not understand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    schema: FeatureSchema,
    scaler: MinMaxScaler,
    classifier: AnyClassifier,
}

impl TrainedModel {
    pub fn new(schema: FeatureSchema, scaler: MinMaxScaler, classifier: AnyClassifier) -> Self {
        Self {
            schema,
            scaler,
            classifier,
        }
    }

    /// The feature layout the model was trained with
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// The wrapped classifier
    pub fn classifier(&self) -> &AnyClassifier {
        &self.classifier
    }

    /// Scale a feature matrix with the stored training-time bounds
    pub fn scale(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        self.scaler.transform(features)
    }

    /// Predict class codes for pre-scaled feature rows
    pub fn predict_rows(&self, scaled: &Array2<f64>) -> Result<Array1<i32>> {
        self.classifier.predict(scaled)
    }

    /// Classify every pixel of a stack into a class-code raster.
    ///
    /// With `masked` set, pixels without spectral coverage get
    /// [`UNCLASSIFIED`] and are never shown to the classifier. The output
    /// carries the stack's geotransform and CRS, with nodata set to the
    /// sentinel.
    pub fn predict_map(&self, stack: &BandStack<f64>, masked: bool) -> Result<Raster<i32>> {
        let matrix = self.schema.build_matrix(stack)?;
        let scaled = self.scaler.transform(&matrix)?;

        let (rows, cols) = (stack.rows(), stack.cols());
        let flat: Vec<i32> = if masked {
            let coverage = coverage_mask(stack);
            let keep: Vec<usize> = (0..scaled.nrows()).filter(|&i| coverage[i]).collect();

            let mut flat = vec![UNCLASSIFIED; rows * cols];
            if !keep.is_empty() {
                let subset = scaled.select(Axis(0), &keep);
                let predicted = self.classifier.predict(&subset)?;
                for (slot, &code) in keep.iter().zip(predicted.iter()) {
                    flat[*slot] = code;
                }
            }
            flat
        } else {
            self.classifier.predict(&scaled)?.to_vec()
        };

        let mut map = Raster::from_vec(flat, rows, cols)?;
        map.set_transform(stack.transform().clone());
        map.set_crs(stack.crs().cloned());
        map.set_nodata(Some(UNCLASSIFIED));
        Ok(map)
    }

    /// Write the artifact as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Pipeline(format!("model serialization failed: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read an artifact written by [`TrainedModel::save`].
    ///
    /// Rejects artifacts with an unsupported schema version or a scaler
    /// fitted on a different column count than the schema describes.
    pub fn load(path: &Path) -> Result<TrainedModel> {
        let json = fs::read_to_string(path)?;
        let model: TrainedModel = serde_json::from_str(&json)
            .map_err(|e| Error::Pipeline(format!("model deserialization failed: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    /// Internal consistency of a deserialized artifact
    fn validate(&self) -> Result<()> {
        self.schema.ensure_supported()?;
        if self.scaler.n_features() != self.schema.width() {
            return Err(Error::SchemaMismatch(format!(
                "scaler fitted on {} columns, schema describes {}",
                self.scaler.n_features(),
                self.schema.width()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::models::{KNearest, KnnParams};
    use crate::classification::SampleSet;
    use ndarray::array;

    /// 1-band 2x2 stack: low pixels labeled 1, high labeled 2, one zeroed
    fn fitted_model_and_stack() -> (TrainedModel, BandStack<f64>) {
        let stack = BandStack::from_vec(vec![1.0, 2.0, 9.0, 0.0], 1, 2, 2).unwrap();

        let schema = FeatureSchema::bands_only(1);
        let train = array![[1.0], [2.0], [9.0], [10.0]];
        let labels = array![1, 1, 2, 2];

        let scaler = MinMaxScaler::fit(&train).unwrap();
        let scaled = scaler.transform(&train).unwrap();

        let mut knn = KNearest::new(KnnParams { k: 1 });
        knn.fit(&scaled, &labels).unwrap();

        (
            TrainedModel::new(schema, scaler, AnyClassifier::KNearest(knn)),
            stack,
        )
    }

    #[test]
    fn masked_map_uses_sentinel_for_uncovered_pixels() {
        let (model, stack) = fitted_model_and_stack();
        let map = model.predict_map(&stack, true).unwrap();

        assert_eq!(map.get(0, 0).unwrap(), 1);
        assert_eq!(map.get(0, 1).unwrap(), 1);
        assert_eq!(map.get(1, 0).unwrap(), 2);
        // the zeroed pixel fails coverage and gets the sentinel
        assert_eq!(map.get(1, 1).unwrap(), UNCLASSIFIED);
        assert_eq!(map.nodata(), Some(UNCLASSIFIED));
    }

    #[test]
    fn unmasked_map_classifies_every_pixel() {
        let (model, stack) = fitted_model_and_stack();
        let map = model.predict_map(&stack, false).unwrap();

        for row in 0..2 {
            for col in 0..2 {
                assert_ne!(map.get(row, col).unwrap(), UNCLASSIFIED);
            }
        }
    }

    #[test]
    fn predictions_stay_within_trained_classes() {
        let (model, stack) = fitted_model_and_stack();
        let map = model.predict_map(&stack, true).unwrap();

        for &code in map.data().iter() {
            assert!(
                code == 1 || code == 2 || code == UNCLASSIFIED,
                "unexpected class code {}",
                code
            );
        }
    }

    #[test]
    fn map_carries_stack_georeferencing() {
        let (model, mut stack) = fitted_model_and_stack();
        let transform = selvagis_core::GeoTransform::new(100.0, 200.0, 10.0, -10.0);
        stack.set_transform(transform.clone());

        let map = model.predict_map(&stack, true).unwrap();
        assert_eq!(map.transform(), &transform);
    }

    #[test]
    fn save_load_roundtrip_predicts_identically() {
        let (model, stack) = fitted_model_and_stack();

        let dir = std::env::temp_dir().join("selvagis-mapper-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.json");

        model.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();
        fs::remove_file(&path).ok();

        let a = model.predict_map(&stack, true).unwrap();
        let b = loaded.predict_map(&stack, true).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn load_rejects_future_schema_version() {
        let (model, _) = fitted_model_and_stack();

        let dir = std::env::temp_dir().join("selvagis-mapper-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("future-model.json");

        model.save(&path).unwrap();
        let json = fs::read_to_string(&path).unwrap();
        let bumped = json.replacen("\"version\": 1", "\"version\": 99", 1);
        assert_ne!(json, bumped, "version field not found in artifact");
        fs::write(&path, bumped).unwrap();

        let result = TrainedModel::load(&path);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn load_rejects_scaler_schema_width_mismatch() {
        let (model, _) = fitted_model_and_stack();

        // Same classifier and scaler, but a two-column schema
        let inconsistent = TrainedModel::new(
            FeatureSchema::bands_only(2),
            model.scaler.clone(),
            model.classifier.clone(),
        );

        let dir = std::env::temp_dir().join("selvagis-mapper-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("inconsistent-model.json");

        inconsistent.save(&path).unwrap();
        let result = TrainedModel::load(&path);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn selection_then_map_pipeline() {
        // End-to-end: select labeled pixels, fit, map the same scene
        let stack = BandStack::from_vec(vec![1.0, 2.0, 8.0, 9.0, 1.5, 0.0], 1, 2, 3).unwrap();
        let labels = Raster::from_vec(vec![1, 1, 2, 2, 0, 1], 2, 3).unwrap();

        let schema = FeatureSchema::bands_only(1);
        let matrix = schema.build_matrix(&stack).unwrap();
        let set = SampleSet::select_labeled(&matrix, &stack, &labels).unwrap();

        let scaler = MinMaxScaler::fit(&set.features).unwrap();
        let scaled = scaler.transform(&set.features).unwrap();

        let mut knn = KNearest::new(KnnParams { k: 1 });
        knn.fit(&scaled, &set.labels).unwrap();

        let model = TrainedModel::new(schema, scaler, AnyClassifier::KNearest(knn));
        let map = model.predict_map(&stack, true).unwrap();

        assert_eq!(map.get(0, 0).unwrap(), 1);
        assert_eq!(map.get(1, 0).unwrap(), 2);
        assert_eq!(map.get(1, 2).unwrap(), UNCLASSIFIED);
    }
}
