//! Color schemes and multi-stop interpolation engine

use serde::{Deserialize, Serialize};

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Available continuous color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    /// Red -> Yellow -> Green (vegetation indices)
    RedYellowGreen,
    /// White -> deep red (change/loss intensity)
    Reds,
    /// Blue -> White -> Red (signed differences)
    BlueWhiteRed,
    /// Black -> White
    Grayscale,
    /// Perceptually uniform dark-purple -> yellow ramp
    Viridis,
}

impl ColorScheme {
    /// All available schemes
    pub const ALL: &[ColorScheme] = &[
        Self::RedYellowGreen,
        Self::Reds,
        Self::BlueWhiteRed,
        Self::Grayscale,
        Self::Viridis,
    ];

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::RedYellowGreen => "Red-Yellow-Green",
            Self::Reds => "Reds",
            Self::BlueWhiteRed => "Blue-White-Red",
            Self::Grayscale => "Grayscale",
            Self::Viridis => "Viridis",
        }
    }
}

const RED_YELLOW_GREEN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 165, 0, 38),
    ColorStop::new(0.25, 244, 109, 67),
    ColorStop::new(0.50, 255, 255, 191),
    ColorStop::new(0.75, 102, 189, 99),
    ColorStop::new(1.00, 0, 104, 55),
];

const REDS_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 255, 245, 240),
    ColorStop::new(0.25, 252, 187, 161),
    ColorStop::new(0.50, 251, 106, 74),
    ColorStop::new(0.75, 203, 24, 29),
    ColorStop::new(1.00, 103, 0, 13),
];

const BLUE_WHITE_RED_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 33, 102, 172),
    ColorStop::new(0.25, 103, 169, 207),
    ColorStop::new(0.50, 247, 247, 247),
    ColorStop::new(0.75, 239, 138, 98),
    ColorStop::new(1.00, 178, 24, 43),
];

const VIRIDIS_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 68, 1, 84),
    ColorStop::new(0.25, 59, 82, 139),
    ColorStop::new(0.50, 33, 145, 140),
    ColorStop::new(0.75, 94, 201, 98),
    ColorStop::new(1.00, 253, 231, 37),
];

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    if t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}

/// Evaluate a color scheme at normalized position `t` in [0, 1].
///
/// Out-of-range positions clamp to the ramp endpoints.
pub fn evaluate(scheme: ColorScheme, t: f64) -> Rgb {
    match scheme {
        ColorScheme::RedYellowGreen => multi_stop(RED_YELLOW_GREEN_STOPS, t),
        ColorScheme::Reds => multi_stop(REDS_STOPS, t),
        ColorScheme::BlueWhiteRed => multi_stop(BLUE_WHITE_RED_STOPS, t),
        ColorScheme::Grayscale => {
            let v = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgb::new(v, v, v)
        }
        ColorScheme::Viridis => multi_stop(VIRIDIS_STOPS, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vegetation_ramp_endpoints() {
        assert_eq!(evaluate(ColorScheme::RedYellowGreen, 0.0), Rgb::new(165, 0, 38));
        assert_eq!(evaluate(ColorScheme::RedYellowGreen, 1.0), Rgb::new(0, 104, 55));
    }

    #[test]
    fn grayscale_midpoint() {
        assert_eq!(evaluate(ColorScheme::Grayscale, 0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn clamping_outside_unit_interval() {
        assert_eq!(
            evaluate(ColorScheme::Reds, -0.5),
            Rgb::new(255, 245, 240)
        );
        assert_eq!(evaluate(ColorScheme::Reds, 1.5), Rgb::new(103, 0, 13));
    }

    #[test]
    fn all_schemes_evaluate_midpoint() {
        for &scheme in ColorScheme::ALL {
            // must not panic anywhere on the ramp
            let _ = evaluate(scheme, 0.5);
            let _ = evaluate(scheme, 0.33);
        }
    }
}
