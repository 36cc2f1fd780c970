//! Sizes, fonts and colours shared by every chart kind

use std::sync::OnceLock;

use plotters::prelude::*;
use tracing::warn;

use crate::palette::ColorScheme;

static TEXT_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Whether a sans-serif system font can be loaded.
///
/// Probed once per process. Without a font every text element (captions,
/// tick labels, legends, annotations) is left out instead of failing.
pub fn text_available() -> bool {
    *TEXT_AVAILABLE.get_or_init(|| {
        match FontDesc::new(FontFamily::SansSerif, 12.0, FontStyle::Normal).layout_box("Mg") {
            Ok(_) => true,
            Err(e) => {
                warn!("No usable sans-serif font ({}); figures are drawn without text", e);
                false
            }
        }
    })
}

/// Drawing parameters resolved for one renderer
#[derive(Debug, Clone)]
pub struct Theme {
    /// Raster resolution
    pub dpi: u32,
    /// Draw text elements
    pub text: bool,
    /// Series colour cycle
    pub colors: Vec<RGBColor>,
    /// Figure background
    pub background: RGBColor,
}

impl Theme {
    /// Theme for `dpi` using `scheme`; text follows [`text_available`].
    pub fn new(dpi: u32, scheme: &ColorScheme, background: RGBColor) -> Self {
        Self {
            dpi,
            text: text_available(),
            colors: scheme.colors(),
            background,
        }
    }

    /// Points to pixels at this resolution
    pub fn px(&self, points: f64) -> u32 {
        (points * f64::from(self.dpi) / 72.0).round().max(1.0) as u32
    }

    /// Black sans-serif text of `points` size
    pub fn font(&self, points: f64) -> TextStyle<'static> {
        ("sans-serif", f64::from(self.px(points))).into_font().color(&BLACK)
    }

    /// Figure and panel captions
    pub fn title_font(&self) -> TextStyle<'static> {
        self.font(14.0)
    }

    /// Axis descriptions and legend entries
    pub fn label_font(&self) -> TextStyle<'static> {
        self.font(11.0)
    }

    /// Tick labels and cell annotations
    pub fn tick_font(&self) -> TextStyle<'static> {
        self.font(9.0)
    }

    /// `i`-th colour of the cycle
    pub fn color(&self, i: usize) -> RGBColor {
        if self.colors.is_empty() {
            RGBColor(31, 119, 180)
        } else {
            self.colors[i % self.colors.len()]
        }
    }

    /// Stroke width for a line of `points` thickness
    pub fn stroke(&self, points: f64) -> u32 {
        self.px(points)
    }

    /// Marker radius in pixels for a marker of `points` diameter
    pub fn marker(&self, points: f64) -> u32 {
        (self.px(points) / 2).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_conversion() {
        let theme = Theme {
            dpi: 300,
            text: false,
            colors: ColorScheme::Default.colors(),
            background: WHITE,
        };
        assert_eq!(theme.px(72.0), 300);
        assert_eq!(theme.px(0.0), 1);
        assert_eq!(theme.color(8), theme.color(0));
        assert_eq!(theme.marker(6.0), 12);
    }
}
