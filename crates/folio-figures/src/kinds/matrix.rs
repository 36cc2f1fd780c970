//! Heatmap and confusion matrix

use folio_common::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};

use super::{Canvas, ChartHandler, Drawn, Labels};
use crate::axes::{self, Frame, Ticks};
use crate::data::Matrix;
use crate::figure::{Area, FigureSize};
use crate::palette::{contrast_text, Colormap, Normalize};
use crate::stats::{self, ClassLabel};
use crate::theme::Theme;

const COLORBAR_STEPS: usize = 64;

fn default_center() -> Option<f64> {
    Some(0.0)
}

fn default_square() -> bool {
    true
}

fn default_decimals() -> usize {
    2
}

/// Coloured matrix, typically a correlation matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapChart {
    /// Matrix to draw; absent or empty input is rejected
    #[serde(default)]
    pub matrix: Option<Matrix>,
    /// Colour scale
    #[serde(default)]
    pub colormap: Colormap,
    /// Value placed at the middle of the colour scale
    #[serde(default = "default_center")]
    pub center: Option<f64>,
    /// Keep cells square
    #[serde(default = "default_square")]
    pub square: bool,
    /// Write each value inside its cell
    #[serde(default)]
    pub annotate: bool,
    /// Decimal places for annotations
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

impl HeatmapChart {
    /// Heatmap of `matrix` with correlation defaults
    pub fn new(matrix: Matrix) -> Self {
        Self {
            matrix: Some(matrix),
            colormap: Colormap::default(),
            center: default_center(),
            square: default_square(),
            annotate: false,
            decimals: default_decimals(),
        }
    }
}

/// Everything needed to paint one matrix
struct Grid {
    rows: Vec<String>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
    colormap: Colormap,
    norm: Normalize,
    square: bool,
    /// Decimal places of the cell annotations, if any
    annotate: Option<usize>,
}

impl Grid {
    fn color(&self, v: f64) -> Option<RGBColor> {
        v.is_finite().then(|| self.colormap.at(self.norm.apply(v)))
    }
}

/// Shrink `area` horizontally so `rows` x `cols` cells come out roughly square
fn squared<'b>(area: &Area<'b>, rows: usize, cols: usize) -> Area<'b> {
    let (w, h) = area.dim_in_pixel();
    let cell = (w / cols.max(1) as u32).min(h / rows.max(1) as u32);
    let used = cell * cols as u32;
    let pad = w.saturating_sub(used) / 2;
    area.margin(0, 0, pad, pad)
}

fn draw_grid(root: &Area<'_>, theme: &Theme, labels: &Labels, grid: &Grid) -> Result<()> {
    let body = match labels.title().filter(|_| theme.text) {
        Some(title) => root.titled(title, theme.title_font())?,
        None => root.clone(),
    };

    let (w, _) = body.dim_in_pixel();
    let bar_w = if theme.text { theme.px(64.0) } else { theme.px(20.0) };
    let (main, bar) = body.split_horizontally(w.saturating_sub(bar_w));
    let main = if grid.square {
        squared(&main, grid.rows.len(), grid.columns.len())
    } else {
        main
    };

    let (n_rows, n_cols) = (grid.rows.len(), grid.columns.len());
    // Row 0 is drawn at the top.
    let row_ticks: Vec<String> = grid.rows.iter().rev().cloned().collect();
    let mut chart = Frame::new()
        .x_desc(labels.x_label())
        .y_desc(labels.y_label())
        .x_ticks(Ticks::Categories(grid.columns.clone()))
        .y_ticks(Ticks::Categories(row_ticks))
        .without_grid()
        .build(
            &main,
            theme,
            axes::category_range(n_cols),
            axes::category_range(n_rows),
        )?;

    let cells: Vec<(f64, f64, f64, RGBColor)> = grid
        .values
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter().enumerate().filter_map(move |(j, &v)| {
                let y = (n_rows - 1 - i) as f64;
                grid.color(v).map(|c| (j as f64, y, v, c))
            })
        })
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, _, c)| {
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], c.filled())
    }))?;

    if let Some(decimals) = grid.annotate.filter(|_| theme.text) {
        let anchor = Pos::new(HPos::Center, VPos::Center);
        chart.draw_series(cells.iter().map(|&(x, y, v, c)| {
            let ink = contrast_text(c);
            let mut style = theme.tick_font().pos(anchor);
            style.color = ink.to_backend_color();
            Text::new(format!("{v:.decimals$}"), (x, y), style)
        }))?;
    }

    draw_colorbar(&bar, theme, grid)
}

fn draw_colorbar(area: &Area<'_>, theme: &Theme, grid: &Grid) -> Result<()> {
    let (lo, hi) = (grid.norm.lo(), grid.norm.hi());
    let range = axes::padded(lo, hi, 0.0);
    let mut bar = Frame::new()
        .x_ticks(Ticks::Hidden)
        .without_grid()
        .build(area, theme, 0.0..1.0, range.clone())?;

    let step = (range.end - range.start) / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|k| {
        let y0 = range.start + step * k as f64;
        let color = grid.colormap.at(grid.norm.apply(y0 + step / 2.0));
        Rectangle::new([(0.0, y0), (1.0, y0 + step)], color.filled())
    }))?;
    Ok(())
}

impl ChartHandler for HeatmapChart {
    fn labels(&self) -> Labels {
        Labels::new("Correlation Heatmap")
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        FigureSize::new(12.0, 8.0)
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let Some(matrix) = self.matrix.as_ref().filter(|m| !m.is_empty()) else {
            return canvas.skip("No correlation matrix provided for heatmap.");
        };
        if matrix.shape().is_none() {
            return canvas.skip("Heatmap rows must all have the same length.");
        }
        let Some((lo, hi)) = matrix.value_range() else {
            return canvas.skip("Heatmap matrix has no finite values.");
        };

        let rows = matrix.values.len();
        let cols = matrix.values[0].len();
        let grid = Grid {
            rows: (0..rows).map(|i| matrix.row_label(i)).collect(),
            columns: (0..cols).map(|j| matrix.column_label(j)).collect(),
            values: matrix.values.clone(),
            colormap: self.colormap,
            norm: Normalize::new(lo, hi, self.center),
            square: self.square,
            annotate: self.annotate.then_some(self.decimals),
        };

        canvas.paint(|root, theme, labels| draw_grid(root, theme, labels, &grid))
    }
}

/// Counts of true against predicted labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrixChart {
    /// Ground truth, one per sample
    pub truth: Vec<ClassLabel>,
    /// Predictions, parallel to `truth`
    pub predicted: Vec<ClassLabel>,
}

impl ChartHandler for ConfusionMatrixChart {
    fn labels(&self) -> Labels {
        Labels::new("Confusion Matrix")
            .x("Predicted Label")
            .y("True Label")
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        if self.truth.len() != self.predicted.len() {
            return canvas.skip(format!(
                "Confusion matrix needs parallel labels ({} true, {} predicted).",
                self.truth.len(),
                self.predicted.len()
            ));
        }
        if self.truth.is_empty() {
            return canvas.skip("No labels provided for confusion matrix.");
        }

        let counts = stats::confusion_counts(&self.truth, &self.predicted);
        let names: Vec<String> = counts.labels.iter().map(ToString::to_string).collect();
        let values: Vec<Vec<f64>> = counts
            .counts
            .iter()
            .map(|row| row.iter().map(|&c| c as f64).collect())
            .collect();
        let max = values.iter().flatten().copied().fold(0.0, f64::max);

        let grid = Grid {
            rows: names.clone(),
            columns: names,
            values,
            colormap: Colormap::Blues,
            norm: Normalize::new(0.0, max, None),
            square: false,
            annotate: Some(0),
        };

        canvas.paint(|root, theme, labels| draw_grid(root, theme, labels, &grid))
    }
}
