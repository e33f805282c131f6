//! End-to-end training pipeline over a synthetic scene

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use selvagis_algorithms::classification::{
    accuracy, AnyClassifier, Classifier, FeatureSchema, MinMaxScaler, SampleSet, TrainedModel,
    UNCLASSIFIED,
};
use selvagis_core::{BandStack, Raster};

/// Synthetic 4-band 6x6 scene with two spectrally distinct covers.
///
/// "Forest" pixels have high NIR and low red; "bare" pixels the reverse.
/// One corner pixel is zeroed in every band to exercise the coverage mask.
fn synthetic_scene() -> (BandStack<f64>, Raster<i32>) {
    let (rows, cols) = (6, 6);
    let forest = |r: usize, c: usize| (r + c) % 2 == 0;

    let mut bands = vec![0.0; 4 * rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            let i = r * cols + c;
            let jitter = (i as f64) * 1e-3;
            let (blue, green, red, nir) = if forest(r, c) {
                (0.05, 0.10, 0.04 + jitter, 0.60 + jitter)
            } else {
                (0.20, 0.25, 0.40 + jitter, 0.20 + jitter)
            };
            bands[i] = blue;
            bands[rows * cols + i] = green;
            bands[2 * rows * cols + i] = red;
            bands[3 * rows * cols + i] = nir;
        }
    }
    // last pixel has no spectral coverage
    for b in 0..4 {
        bands[b * rows * cols + (rows * cols - 1)] = 0.0;
    }
    let stack = BandStack::from_vec(bands, 4, rows, cols).unwrap();

    // label most pixels, leave a few unlabeled (code 0)
    let mut labels = vec![0; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            if (r + c) % 5 == 4 {
                continue; // unlabeled
            }
            labels[r * cols + c] = if forest(r, c) { 1 } else { 6 };
        }
    }
    let labels = Raster::from_vec(labels, rows, cols).unwrap();

    (stack, labels)
}

#[test]
fn train_evaluate_and_map_a_scene() {
    let (stack, labels) = synthetic_scene();

    let schema = FeatureSchema::bands_with_ndvi(4, 2, 3).unwrap();
    let matrix = schema.build_matrix(&stack).unwrap();

    let mut set = SampleSet::select_labeled(&matrix, &stack, &labels).unwrap();
    assert!(set.len() > 20);
    assert_eq!(set.class_codes(), vec![1, 6]);

    let mut rng = StdRng::seed_from_u64(42);
    set.shuffle(&mut rng);
    set.truncate(100_000);
    let (train, val) = set.split(0.8, &mut rng).unwrap();

    let scaler = MinMaxScaler::fit(&train.features).unwrap();
    let train_x = scaler.transform(&train.features).unwrap();
    let val_x = scaler.transform(&val.features).unwrap();

    let mut classifier = AnyClassifier::by_name("tree").unwrap();
    classifier.fit(&train_x, &train.labels).unwrap();

    let predicted = classifier.predict(&val_x).unwrap();
    let acc = accuracy(&val.labels, &predicted).unwrap();
    assert!(acc > 0.9, "validation accuracy {} too low", acc);

    let model = TrainedModel::new(schema, scaler, classifier);
    let map = model.predict_map(&stack, true).unwrap();

    assert_eq!(map.shape(), (6, 6));
    assert_eq!(map.get(5, 5).unwrap(), UNCLASSIFIED);

    // every prediction is a trained class or the sentinel
    for &code in map.data().iter() {
        assert!(code == 1 || code == 6 || code == UNCLASSIFIED);
    }

    // spot-check the checkerboard away from the zeroed pixel
    assert_eq!(map.get(0, 0).unwrap(), 1);
    assert_eq!(map.get(0, 1).unwrap(), 6);
    assert_eq!(map.get(2, 2).unwrap(), 1);
}

#[test]
fn every_model_handles_the_scene() {
    let (stack, labels) = synthetic_scene();

    let schema = FeatureSchema::bands_with_ndvi(4, 2, 3).unwrap();
    let matrix = schema.build_matrix(&stack).unwrap();
    let set = SampleSet::select_labeled(&matrix, &stack, &labels).unwrap();

    let scaler = MinMaxScaler::fit(&set.features).unwrap();
    let x = scaler.transform(&set.features).unwrap();

    for mut model in AnyClassifier::default_suite() {
        model.fit(&x, &set.labels).unwrap();
        let predicted = model.predict(&x).unwrap();
        let acc = accuracy(&set.labels, &predicted).unwrap();
        assert!(
            acc > 0.8,
            "{} training accuracy {} too low on separable data",
            model.name(),
            acc
        );
        for &code in predicted.iter() {
            assert!(code == 1 || code == 6, "{} invented class {}", model.name(), code);
        }
    }
}

#[test]
fn sentinel_never_collides_with_labels() {
    let labels: Array1<i32> = Array1::from_vec(vec![1, 2, 3, 4, 5, 6, 7, 8]);
    for &code in labels.iter() {
        assert_ne!(code, UNCLASSIFIED);
    }
}
