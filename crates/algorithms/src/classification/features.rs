//! Feature schema and matrix construction
//!
//! The feature layout used at training time must be reproduced exactly at
//! prediction time; a silent band-order mismatch corrupts every prediction.
//! The schema makes that layout an explicit, versioned, checked structure
//! instead of positional concatenation.

use crate::imagery::NDVI_EPSILON;
use ndarray::Array2;
use selvagis_core::{BandStack, Error, Result};
use serde::{Deserialize, Serialize};

/// Current schema layout version
pub const SCHEMA_VERSION: u32 = 1;

/// Where a feature column's values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSource {
    /// Raw reflectance of one band (0-indexed)
    Band(usize),
    /// Epsilon-stabilized NDVI derived from two bands
    Ndvi { red: usize, nir: usize },
}

/// One named column of the feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub source: ColumnSource,
}

/// Ordered, versioned description of the per-pixel feature vector.
///
/// Stored inside the trained-model artifact; [`FeatureSchema::ensure_matches`]
/// rejects prediction against a layout the model was not trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    version: u32,
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    /// All raw bands followed by one NDVI column — the standard layout.
    pub fn bands_with_ndvi(n_bands: usize, red: usize, nir: usize) -> Result<Self> {
        if red >= n_bands {
            return Err(Error::BandOutOfRange {
                band: red,
                bands: n_bands,
            });
        }
        if nir >= n_bands {
            return Err(Error::BandOutOfRange {
                band: nir,
                bands: n_bands,
            });
        }

        let mut columns: Vec<FeatureColumn> = (0..n_bands)
            .map(|i| FeatureColumn {
                name: format!("band_{}", i + 1),
                source: ColumnSource::Band(i),
            })
            .collect();
        columns.push(FeatureColumn {
            name: "ndvi".to_string(),
            source: ColumnSource::Ndvi { red, nir },
        });

        Ok(Self {
            version: SCHEMA_VERSION,
            columns,
        })
    }

    /// Raw bands only, no derived index
    pub fn bands_only(n_bands: usize) -> Self {
        Self {
            version: SCHEMA_VERSION,
            columns: (0..n_bands)
                .map(|i| FeatureColumn {
                    name: format!("band_{}", i + 1),
                    source: ColumnSource::Band(i),
                })
                .collect(),
        }
    }

    /// Number of feature columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// The ordered columns
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Smallest band count a stack must have to satisfy this schema
    pub fn required_bands(&self) -> usize {
        self.columns
            .iter()
            .map(|c| match c.source {
                ColumnSource::Band(b) => b + 1,
                ColumnSource::Ndvi { red, nir } => red.max(nir) + 1,
            })
            .max()
            .unwrap_or(0)
    }

    /// Error unless this schema's version is one the running build reads.
    ///
    /// Guards deserialized artifacts; in-crate constructors always stamp
    /// [`SCHEMA_VERSION`].
    pub fn ensure_supported(&self) -> Result<()> {
        if self.version != SCHEMA_VERSION {
            return Err(Error::SchemaMismatch(format!(
                "schema version {} not supported, this build reads version {}",
                self.version, SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    /// Error unless `other` describes the exact same layout
    pub fn ensure_matches(&self, other: &FeatureSchema) -> Result<()> {
        if self.version != other.version {
            return Err(Error::SchemaMismatch(format!(
                "version {} vs {}",
                self.version, other.version
            )));
        }
        if self.columns != other.columns {
            return Err(Error::SchemaMismatch(format!(
                "column layout differs: [{}] vs [{}]",
                column_names(&self.columns),
                column_names(&other.columns)
            )));
        }
        Ok(())
    }

    /// Build the (pixels, columns) feature matrix for a stack.
    ///
    /// Pixels are laid out in row-major order: flattened index
    /// `i = row * cols + col`. Reshaping a per-pixel result back with the
    /// same order reconstructs the spatial grid.
    pub fn build_matrix(&self, stack: &BandStack<f64>) -> Result<Array2<f64>> {
        if stack.bands() < self.required_bands() {
            return Err(Error::BandOutOfRange {
                band: self.required_bands() - 1,
                bands: stack.bands(),
            });
        }

        let pixels = stack.pixels();
        let mut matrix = Array2::zeros((pixels, self.width()));

        for (j, column) in self.columns.iter().enumerate() {
            match column.source {
                ColumnSource::Band(b) => {
                    let band = stack.band_view(b)?;
                    for (i, &v) in band.iter().enumerate() {
                        matrix[(i, j)] = v;
                    }
                }
                ColumnSource::Ndvi { red, nir } => {
                    let red_band = stack.band_view(red)?;
                    let nir_band = stack.band_view(nir)?;
                    for (i, (&r, &n)) in red_band.iter().zip(nir_band.iter()).enumerate() {
                        matrix[(i, j)] = (n - r) / (n + r + NDVI_EPSILON);
                    }
                }
            }
        }

        Ok(matrix)
    }
}

fn column_names(columns: &[FeatureColumn]) -> String {
    columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stack() -> BandStack<f64> {
        // 2 bands, 2x2: band 0 (red) constant 0.2, band 1 (nir) constant 0.8
        BandStack::from_vec(
            vec![0.2, 0.2, 0.2, 0.2, 0.8, 0.8, 0.8, 0.8],
            2,
            2,
            2,
        )
        .unwrap()
    }

    #[test]
    fn layout_bands_then_ndvi() {
        let schema = FeatureSchema::bands_with_ndvi(4, 2, 3).unwrap();
        assert_eq!(schema.width(), 5);
        assert_eq!(schema.columns()[0].source, ColumnSource::Band(0));
        assert_eq!(
            schema.columns()[4].source,
            ColumnSource::Ndvi { red: 2, nir: 3 }
        );
        assert_eq!(schema.required_bands(), 4);
    }

    #[test]
    fn band_out_of_range_rejected() {
        assert!(FeatureSchema::bands_with_ndvi(2, 0, 2).is_err());
        assert!(FeatureSchema::bands_with_ndvi(2, 2, 1).is_err());
    }

    #[test]
    fn matrix_values_and_order() {
        let schema = FeatureSchema::bands_with_ndvi(2, 0, 1).unwrap();
        let matrix = schema.build_matrix(&sample_stack()).unwrap();

        assert_eq!(matrix.dim(), (4, 3));
        // raw bands
        assert!((matrix[(0, 0)] - 0.2).abs() < 1e-12);
        assert!((matrix[(3, 1)] - 0.8).abs() < 1e-12);
        // ndvi column
        let expected = (0.8 - 0.2) / (0.8 + 0.2 + NDVI_EPSILON);
        assert!((matrix[(2, 2)] - expected).abs() < 1e-12);
    }

    #[test]
    fn matrix_row_major_pixel_order() {
        // 1 band, 2x3, values 0..6 laid out row-major
        let stack = BandStack::from_vec((0..6).map(f64::from).collect(), 1, 2, 3).unwrap();
        let schema = FeatureSchema::bands_only(1);
        let matrix = schema.build_matrix(&stack).unwrap();

        for i in 0..6 {
            assert_eq!(matrix[(i, 0)], i as f64);
        }
    }

    #[test]
    fn schema_mismatch_detected() {
        let a = FeatureSchema::bands_with_ndvi(4, 2, 3).unwrap();
        let b = FeatureSchema::bands_with_ndvi(4, 3, 2).unwrap();
        let c = FeatureSchema::bands_only(4);

        assert!(a.ensure_matches(&a.clone()).is_ok());
        assert!(a.ensure_matches(&b).is_err());
        assert!(a.ensure_matches(&c).is_err());
    }

    #[test]
    fn stack_too_small_for_schema() {
        let schema = FeatureSchema::bands_with_ndvi(4, 2, 3).unwrap();
        let stack = BandStack::from_vec(vec![0.0; 8], 2, 2, 2).unwrap();
        assert!(schema.build_matrix(&stack).is_err());
    }
}
