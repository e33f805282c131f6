//! Discrete land-cover legend
//!
//! Maps integer class codes to names and colors for rendering classified
//! maps and labelling evaluation reports. The default legend follows the
//! ESA WorldCover-style eight-class scheme the training labels use.

use crate::scheme::Rgb;
use selvagis_core::Raster;
use serde::{Deserialize, Serialize};

/// One legend entry: class code, display name, map color
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendEntry {
    pub code: i32,
    pub name: String,
    pub color: Rgb,
}

/// Ordered set of land-cover classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandCoverLegend {
    entries: Vec<LegendEntry>,
}

impl Default for LandCoverLegend {
    fn default() -> Self {
        let table: &[(i32, &str, Rgb)] = &[
            (1, "tree cover", Rgb::new(0, 100, 0)),
            (2, "shrubland", Rgb::new(255, 187, 34)),
            (3, "grassland", Rgb::new(255, 255, 76)),
            (4, "cropland", Rgb::new(240, 150, 255)),
            (5, "built-up", Rgb::new(250, 0, 0)),
            (6, "bare / sparse vegetation", Rgb::new(180, 180, 180)),
            (7, "snow and ice", Rgb::new(240, 240, 240)),
            (8, "permanent water bodies", Rgb::new(0, 100, 200)),
        ];
        Self {
            entries: table
                .iter()
                .map(|&(code, name, color)| LegendEntry {
                    code,
                    name: name.to_string(),
                    color,
                })
                .collect(),
        }
    }
}

impl LandCoverLegend {
    pub fn new(entries: Vec<LegendEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    /// Class codes in legend order
    pub fn codes(&self) -> Vec<i32> {
        self.entries.iter().map(|e| e.code).collect()
    }

    /// `(code, name)` pairs in legend order, the shape evaluation reports take
    pub fn named_codes(&self) -> Vec<(i32, String)> {
        self.entries
            .iter()
            .map(|e| (e.code, e.name.clone()))
            .collect()
    }

    pub fn name_of(&self, code: i32) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.name.as_str())
    }

    pub fn color_of(&self, code: i32) -> Option<Rgb> {
        self.entries.iter().find(|e| e.code == code).map(|e| e.color)
    }

    /// Render a classified map to an RGBA buffer in row-major order.
    ///
    /// Codes absent from the legend (including the unclassified sentinel)
    /// come out fully transparent.
    pub fn classified_to_rgba(&self, map: &Raster<i32>) -> Vec<u8> {
        let mut rgba = vec![0u8; map.len() * 4];
        for (i, &code) in map.data().iter().enumerate() {
            if let Some(color) = self.color_of(code) {
                let offset = i * 4;
                rgba[offset] = color.r;
                rgba[offset + 1] = color.g;
                rgba[offset + 2] = color.b;
                rgba[offset + 3] = 255;
            }
        }
        rgba
    }
}
