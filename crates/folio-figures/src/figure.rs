//! Figure handles and their lifecycle accounting

use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use folio_common::{ensure, FolioError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Drawing area over a figure's pixel buffer
pub type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Figure dimensions in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    /// Width in inches
    pub width: f64,
    /// Height in inches
    pub height: f64,
}

impl FigureSize {
    /// Size of `width` by `height` inches
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions at `dpi`
    pub fn pixels(&self, dpi: u32) -> (u32, u32) {
        let to_px = |inches: f64| (inches * f64::from(dpi)).round().max(1.0) as u32;
        (to_px(self.width), to_px(self.height))
    }

    /// Both sides must be finite and positive
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width.is_finite() && self.width > 0.0,
            FolioError::validation_field(
                format!("figure width must be positive inches, got {}", self.width),
                "figure_width",
            )
        );
        ensure!(
            self.height.is_finite() && self.height > 0.0,
            FolioError::validation_field(
                format!("figure height must be positive inches, got {}", self.height),
                "figure_height",
            )
        );
        Ok(())
    }
}

impl Default for FigureSize {
    fn default() -> Self {
        Self::new(10.0, 6.0)
    }
}

/// Counts figures acquired and released by a renderer
#[derive(Debug, Default)]
pub struct FigureLedger {
    created: AtomicUsize,
    released: AtomicUsize,
}

impl FigureLedger {
    /// Figures acquired so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Figures released so far
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Figures currently alive
    pub fn open(&self) -> usize {
        self.created().saturating_sub(self.released())
    }
}

/// The drawing surface of one render call.
///
/// Pixel storage is allocated on the first [`Figure::draw`]; dropping the
/// handle releases it and records the release in the ledger.
pub struct Figure {
    id: Uuid,
    title: Option<String>,
    panel_titles: Vec<String>,
    width_px: u32,
    height_px: u32,
    pixels: Option<Vec<u8>>,
    ledger: Arc<FigureLedger>,
}

impl Figure {
    pub(crate) fn acquire(ledger: Arc<FigureLedger>, size: FigureSize, dpi: u32) -> Self {
        ledger.created.fetch_add(1, Ordering::SeqCst);
        let (width_px, height_px) = size.pixels(dpi);
        let id = Uuid::new_v4();
        debug!(figure = %id, "Acquired {}x{} px figure", width_px, height_px);

        Self {
            id,
            title: None,
            panel_titles: Vec::new(),
            width_px,
            height_px,
            pixels: None,
            ledger,
        }
    }

    /// Unique handle id, used in log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Width and height in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    /// Whether pixel storage has been allocated
    pub fn is_drawn(&self) -> bool {
        self.pixels.is_some()
    }

    pub(crate) fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub(crate) fn set_panel_titles(&mut self, titles: Vec<String>) {
        self.panel_titles = titles;
    }

    /// Fill the figure with `background` and run `paint` on it.
    pub(crate) fn draw<F>(&mut self, background: RGBColor, paint: F) -> Result<()>
    where
        F: FnOnce(&Area<'_>) -> Result<()>,
    {
        let (w, h) = (self.width_px, self.height_px);
        let buffer = self
            .pixels
            .get_or_insert_with(|| vec![0u8; w as usize * h as usize * 3]);

        let root = BitMapBackend::with_buffer(buffer.as_mut_slice(), (w, h)).into_drawing_area();
        root.fill(&background)?;
        paint(&root)?;
        root.present()?;
        Ok(())
    }

    /// Encode the pixels as PNG with a `pHYs` chunk for `dpi`, creating
    /// parent directories as needed.
    pub(crate) fn save_png(&self, path: &Path, dpi: u32) -> Result<()> {
        let pixels = self
            .pixels
            .as_deref()
            .ok_or_else(|| FolioError::render("Figure has nothing drawn on it"))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(path)?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width_px, self.height_px);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let per_meter = dots_per_meter(dpi);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: per_meter,
            yppu: per_meter,
            unit: png::Unit::Meter,
        }));

        let mut writer = encoder.write_header()?;
        writer.write_image_data(pixels)?;
        writer.finish()?;
        Ok(())
    }

    /// Read-only snapshot handed to display sinks
    pub fn view<'a>(&'a self, saved: Option<&'a Path>) -> FigureView<'a> {
        FigureView {
            title: self.title.as_deref(),
            panel_titles: &self.panel_titles,
            width: self.width_px,
            height: self.height_px,
            pixels: self.pixels.as_deref().unwrap_or(&[]),
            saved,
        }
    }
}

impl Drop for Figure {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
        debug!(figure = %self.id, "Released figure");
    }
}

fn dots_per_meter(dpi: u32) -> u32 {
    (f64::from(dpi) / 0.0254).round() as u32
}

/// What a display sink sees of a finished figure
#[derive(Debug, Clone, Copy)]
pub struct FigureView<'a> {
    /// Title as given, not slugified
    pub title: Option<&'a str>,
    /// Sub-panel captions, in drawing order
    pub panel_titles: &'a [String],
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Packed RGB rows
    pub pixels: &'a [u8],
    /// Where the figure was written, if anywhere
    pub saved: Option<&'a Path>,
}
