//! # SelvaGis Colormap
//!
//! Color mapping and raster rendering for SelvaGis: continuous schemes
//! with a multi-stop interpolation engine, a discrete land-cover legend,
//! and PNG export. The main entry points are [`raster_to_rgba`] for
//! continuous data and [`LandCoverLegend::classified_to_rgba`] for
//! classified maps.
//!
//! ## Usage
//!
//! ```ignore
//! use selvagis_colormap::{ColorScheme, ColormapParams, raster_to_rgba};
//!
//! let params = ColormapParams::with_range(ColorScheme::RedYellowGreen, -1.0, 1.0);
//! let rgba = raster_to_rgba(&ndvi, &params);
//! ```

mod legend;
mod render;
mod scheme;

pub use legend::{LandCoverLegend, LegendEntry};
pub use render::{auto_params, raster_to_rgba, render_png, save_png, ColormapParams};
pub use scheme::{evaluate, ColorScheme, ColorStop, Rgb};
