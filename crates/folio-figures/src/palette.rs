//! Colour schemes, named colours and continuous colormaps

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Discrete colour cycle used for series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ColorScheme {
    /// tab10
    #[default]
    Default,
    /// Saturated colours for dark backgrounds
    Dark,
    /// Pastels
    Light,
    /// High contrast
    Vibrant,
    /// Greys
    Monochrome,
    /// User supplied hex colours
    Custom(Vec<String>),
}

impl ColorScheme {
    /// Resolve a configured palette name; unknown names fall back to `Default`.
    pub fn from_name(name: &str, custom: &[String]) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "dark" => Self::Dark,
            "light" => Self::Light,
            "vibrant" => Self::Vibrant,
            "monochrome" => Self::Monochrome,
            "custom" if !custom.is_empty() => Self::Custom(custom.to_vec()),
            _ => Self::Default,
        }
    }

    /// The colour cycle. Never empty.
    pub fn colors(&self) -> Vec<RGBColor> {
        match self {
            ColorScheme::Default => vec![
                RGBColor(31, 119, 180),  // Blue
                RGBColor(255, 127, 14),  // Orange
                RGBColor(44, 160, 44),   // Green
                RGBColor(214, 39, 40),   // Red
                RGBColor(148, 103, 189), // Purple
                RGBColor(140, 86, 75),   // Brown
                RGBColor(227, 119, 194), // Pink
                RGBColor(127, 127, 127), // Gray
            ],
            ColorScheme::Dark => vec![
                RGBColor(55, 126, 184),  // Light Blue
                RGBColor(255, 152, 150), // Light Red
                RGBColor(77, 175, 74),   // Light Green
                RGBColor(255, 187, 120), // Light Orange
                RGBColor(152, 78, 163),  // Light Purple
            ],
            ColorScheme::Light => vec![
                RGBColor(166, 206, 227), // Pale Blue
                RGBColor(251, 180, 174), // Pale Red
                RGBColor(179, 226, 205), // Pale Green
                RGBColor(253, 205, 172), // Pale Orange
                RGBColor(203, 213, 232), // Pale Purple
            ],
            ColorScheme::Vibrant => vec![
                RGBColor(230, 25, 75),   // Red
                RGBColor(60, 180, 75),   // Green
                RGBColor(255, 225, 25),  // Yellow
                RGBColor(0, 130, 200),   // Blue
                RGBColor(245, 130, 48),  // Orange
                RGBColor(145, 30, 180),  // Purple
                RGBColor(70, 240, 240),  // Cyan
                RGBColor(240, 50, 230),  // Magenta
            ],
            ColorScheme::Monochrome => vec![
                RGBColor(0, 0, 0),       // Black
                RGBColor(64, 64, 64),    // Dark Gray
                RGBColor(128, 128, 128), // Gray
                RGBColor(192, 192, 192), // Light Gray
            ],
            ColorScheme::Custom(colors) => {
                let parsed: Vec<RGBColor> = colors.iter().filter_map(|c| parse_color(c)).collect();
                if parsed.is_empty() {
                    ColorScheme::Default.colors()
                } else {
                    parsed
                }
            }
        }
    }
}

/// Parse a `#RRGGBB` string
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let hex = color_str.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Look up a colour by name (`red`, `navy`, `k`, ...) or hex string
pub fn resolve_color(name: &str) -> Option<RGBColor> {
    if name.starts_with('#') {
        return parse_color(name);
    }
    let rgb = match name.trim().to_ascii_lowercase().as_str() {
        "red" | "r" => RGBColor(255, 0, 0),
        "green" | "g" => RGBColor(0, 128, 0),
        "blue" | "b" => RGBColor(0, 0, 255),
        "orange" => RGBColor(255, 165, 0),
        "darkorange" => RGBColor(255, 140, 0),
        "purple" => RGBColor(128, 0, 128),
        "brown" => RGBColor(165, 42, 42),
        "black" | "k" => RGBColor(0, 0, 0),
        "white" | "w" => RGBColor(255, 255, 255),
        "gray" | "grey" => RGBColor(128, 128, 128),
        "navy" => RGBColor(0, 0, 128),
        "cyan" | "c" => RGBColor(0, 255, 255),
        "magenta" | "m" => RGBColor(255, 0, 255),
        "yellow" | "y" => RGBColor(255, 255, 0),
        "pink" => RGBColor(255, 192, 203),
        _ => return None,
    };
    Some(rgb)
}

/// Resolve a list of colour names, skipping unknown ones
pub fn named(names: &[&str]) -> Vec<RGBColor> {
    names.iter().filter_map(|n| resolve_color(n)).collect()
}

/// Black or white, whichever reads better on `background`
pub fn contrast_text(background: RGBColor) -> RGBColor {
    let RGBColor(r, g, b) = background;
    let luminance = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    if luminance > 140.0 {
        RGBColor(0, 0, 0)
    } else {
        RGBColor(255, 255, 255)
    }
}

/// Continuous colormap for matrix cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// Diverging blue to red
    #[default]
    #[serde(alias = "coolwarm")]
    CoolWarm,
    /// Sequential white to blue
    #[serde(alias = "Blues")]
    Blues,
    /// Perceptually uniform purple to yellow
    Viridis,
}

impl Colormap {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            Colormap::CoolWarm => &[
                (59, 76, 192),
                (141, 176, 254),
                (221, 221, 221),
                (244, 154, 123),
                (180, 4, 38),
            ],
            Colormap::Blues => &[
                (247, 251, 255),
                (198, 219, 239),
                (107, 174, 214),
                (33, 113, 181),
                (8, 48, 107),
            ],
            Colormap::Viridis => &[
                (68, 1, 84),
                (59, 82, 139),
                (33, 145, 140),
                (94, 201, 98),
                (253, 231, 37),
            ],
        }
    }

    /// Colour at `t` in `[0, 1]` (clamped; NaN maps to the midpoint)
    pub fn at(self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let pos = t * (stops.len() - 1) as f64;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        let frac = pos - i as f64;
        let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;
        let (a, b) = (stops[i], stops[i + 1]);
        RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }
}

/// Maps data values onto `[0, 1]`, optionally symmetric around a centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    lo: f64,
    hi: f64,
}

impl Normalize {
    /// Linear map of `[lo, hi]`. With a centre, the range is widened so the
    /// centre lands on 0.5.
    pub fn new(lo: f64, hi: f64, center: Option<f64>) -> Self {
        let (lo, hi) = match center {
            Some(c) => {
                let half = (hi - c).abs().max((c - lo).abs());
                (c - half, c + half)
            }
            None => (lo, hi),
        };
        Self { lo, hi }
    }

    /// Lower bound of the mapped range
    pub fn lo(&self) -> f64 {
        self.lo
    }

    /// Upper bound of the mapped range
    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Position of `v` in `[0, 1]`
    pub fn apply(&self, v: f64) -> f64 {
        if self.hi - self.lo <= f64::EPSILON {
            0.5
        } else {
            ((v - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0)
        }
    }
}
