//! Histogram, class-conditional density and box plots

use folio_common::Result;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Canvas, ChartHandler, Drawn, Labels};
use crate::axes::{self, Frame, Ticks};
use crate::data::{Cell, Table};
use crate::stats::{self, BoxSummary, Kde};

const KDE_POINTS: usize = 200;

fn default_bins() -> usize {
    20
}

fn default_bw_adjust() -> f64 {
    1.0
}

fn default_fill() -> bool {
    true
}

fn default_alpha() -> f64 {
    0.4
}

/// Histogram of one column with a density overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramChart {
    /// Source table
    pub table: Table,
    /// Column to bin
    pub column: String,
    /// Number of equal-width bins
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Symmetric-log x axis
    #[serde(default)]
    pub log_scale: bool,
}

impl HistogramChart {
    /// Histogram of `column` with default options
    pub fn new(table: Table, column: impl Into<String>) -> Self {
        Self {
            table,
            column: column.into(),
            bins: default_bins(),
            log_scale: false,
        }
    }
}

impl ChartHandler for HistogramChart {
    fn labels(&self) -> Labels {
        Labels::new(format!("Distribution of {}", self.column))
            .x(self.column.clone())
            .y("Count")
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let Some(mut values) = self.table.numeric(&self.column) else {
            return canvas.skip(format!("Column '{}' not found for histogram.", self.column));
        };
        values.retain(|v| v.is_finite());
        if self.log_scale {
            values.iter_mut().for_each(|v| *v = axes::symlog(*v));
        }

        let Some(hist) = stats::histogram(&values, self.bins) else {
            return canvas.skip(format!(
                "No numeric data available to plot for column '{}'.",
                self.column
            ));
        };

        // Density scaled so its area matches the bar area.
        let scale = values.len() as f64 * hist.bin_width();
        let lo = hist.edges[0];
        let hi = hist.edges[hist.edges.len() - 1];
        let curve: Vec<(f64, f64)> = Kde::fit(&values, 1.0)
            .map(|kde| {
                kde.curve((lo, hi), KDE_POINTS)
                    .into_iter()
                    .map(|(x, d)| (x, d * scale))
                    .collect()
            })
            .unwrap_or_default();

        let y_top = curve
            .iter()
            .map(|p| p.1)
            .fold(hist.max_count() as f64, f64::max)
            * 1.05;

        let ticks = if self.log_scale { Ticks::SymLog } else { Ticks::Numeric };

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .x_ticks(ticks)
                .without_x_grid()
                .build(root, theme, axes::padded(lo, hi, 0.02), 0.0..y_top)?;

            let color = theme.color(0);
            chart.draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
                Rectangle::new(
                    [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
                    color.mix(0.6).filled(),
                )
            }))?;
            chart.draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
                Rectangle::new(
                    [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
                    color.stroke_width(1),
                )
            }))?;

            if !curve.is_empty() {
                chart.draw_series(LineSeries::new(
                    curve.iter().copied(),
                    color.stroke_width(theme.stroke(1.5)),
                ))?;
            }
            Ok(())
        })
    }
}

/// Group numeric `value` cells by the label in `key`, dropping rows where
/// either is missing. Groups keep first-appearance order unless every
/// label is numeric, in which case they are sorted by value.
pub(crate) fn group_by_label(keys: &[Cell], values: &[Cell]) -> Vec<(String, Vec<f64>)> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for (key, value) in keys.iter().zip(values) {
        let (Some(label), Some(v)) = (key.as_label(), value.as_number()) else {
            continue;
        };
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, vs)) => vs.push(v),
            None => groups.push((label, vec![v])),
        }
    }

    let numeric: Option<Vec<f64>> = groups.iter().map(|(l, _)| l.parse::<f64>().ok()).collect();
    if let Some(keys) = numeric {
        let mut keyed: Vec<(f64, (String, Vec<f64>))> = keys.into_iter().zip(groups).collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        groups = keyed.into_iter().map(|(_, g)| g).collect();
    }
    groups
}

/// Kernel density of one column, one curve per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityChart {
    /// Source table
    pub table: Table,
    /// Feature column
    pub x: String,
    /// Class column
    pub class_col: String,
    /// Bandwidth multiplier
    #[serde(default = "default_bw_adjust")]
    pub bw_adjust: f64,
    /// Fill under each curve
    #[serde(default = "default_fill")]
    pub fill: bool,
    /// Fill opacity
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl DensityChart {
    /// Density of `x` split by `class_col` with default options
    pub fn new(table: Table, x: impl Into<String>, class_col: impl Into<String>) -> Self {
        Self {
            table,
            x: x.into(),
            class_col: class_col.into(),
            bw_adjust: default_bw_adjust(),
            fill: default_fill(),
            alpha: default_alpha(),
        }
    }
}

impl ChartHandler for DensityChart {
    fn labels(&self) -> Labels {
        Labels::new(format!("Density by {}: {}", self.class_col, self.x))
            .x(self.x.clone())
            .y("Density")
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let (Some(x_col), Some(class_col)) =
            (self.table.column(&self.x), self.table.column(&self.class_col))
        else {
            let missing = self.table.missing_columns(&[&self.x, &self.class_col]);
            return canvas.skip(format!(
                "Columns not found for density plot: x='{}', class_col='{}' (missing: {})",
                self.x,
                self.class_col,
                missing.join(", ")
            ));
        };

        let groups = group_by_label(&class_col.cells, &x_col.cells);
        if groups.is_empty() {
            return canvas.skip(format!(
                "No valid data to plot density for '{}' by '{}'.",
                self.x, self.class_col
            ));
        }

        let curves: Vec<(String, Vec<(f64, f64)>)> = groups
            .iter()
            .filter_map(|(label, values)| match Kde::fit(values, self.bw_adjust) {
                Some(kde) => Some((label.clone(), kde.curve(kde.support(), KDE_POINTS))),
                None => {
                    debug!("Class '{}' has no spread; density not drawn", label);
                    None
                }
            })
            .collect();
        if curves.is_empty() {
            return canvas.skip(format!(
                "No class of '{}' has enough spread to estimate a density for '{}'.",
                self.class_col, self.x
            ));
        }

        let x_range = axes::data_range(curves.iter().flat_map(|(_, c)| c.iter().map(|p| p.0)), 0.0);
        let y_top = curves
            .iter()
            .flat_map(|(_, c)| c.iter().map(|p| p.1))
            .fold(0.0, f64::max)
            * 1.05;
        let alpha = self.alpha.clamp(0.0, 1.0);
        let fill = self.fill;

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .build(root, theme, x_range, 0.0..y_top)?;

            for (i, (label, curve)) in curves.iter().enumerate() {
                let color = theme.color(i);
                let line = color.stroke_width(theme.stroke(1.5));
                let mut anno = if fill {
                    chart.draw_series(
                        AreaSeries::new(curve.iter().copied(), 0.0, color.mix(alpha).filled())
                            .border_style(line),
                    )?
                } else {
                    chart.draw_series(LineSeries::new(curve.iter().copied(), line))?
                };
                anno.label(label.as_str()).legend(axes::line_swatch(line, theme));
            }

            axes::draw_legend(&mut chart, theme, SeriesLabelPosition::UpperRight)
        })
    }
}

/// Box plot of a numeric column, optionally grouped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxChart {
    /// Source table
    pub table: Table,
    /// Numeric column
    pub y: String,
    /// Optional grouping column
    #[serde(default)]
    pub x: Option<String>,
}

impl ChartHandler for BoxChart {
    fn labels(&self) -> Labels {
        Labels::new(format!("Distribution of {}", self.y))
            .x(self.x.clone().unwrap_or_default())
            .y(self.y.clone())
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let Some(y_col) = self.table.column(&self.y) else {
            return canvas.skip(format!("Column '{}' not found for box plot.", self.y));
        };

        let groups = match &self.x {
            Some(x) => match self.table.column(x) {
                Some(x_col) => group_by_label(&x_col.cells, &y_col.cells),
                None => return canvas.skip(format!("Column '{x}' not found for box plot.")),
            },
            None => {
                let values: Vec<f64> = y_col.cells.iter().filter_map(Cell::as_number).collect();
                if values.is_empty() {
                    Vec::new()
                } else {
                    vec![(String::new(), values)]
                }
            }
        };

        let boxes: Vec<(String, BoxSummary)> = groups
            .iter()
            .filter_map(|(label, values)| {
                BoxSummary::from_values(values).map(|s| (label.clone(), s))
            })
            .collect();
        if boxes.is_empty() {
            return canvas.skip(format!(
                "No numeric data available to plot for column '{}'.",
                self.y
            ));
        }

        let y_range = axes::data_range(
            boxes.iter().flat_map(|(_, s)| {
                let (lo, hi) = s.span();
                [lo, hi]
            }),
            0.05,
        );
        let ticks = if self.x.is_some() {
            Ticks::Categories(boxes.iter().map(|(l, _)| l.clone()).collect())
        } else {
            Ticks::Hidden
        };
        let grouped = self.x.is_some();

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .x_ticks(ticks)
                .without_x_grid()
                .build(root, theme, axes::category_range(boxes.len()), y_range)?;

            let edge = RGBColor(60, 60, 60).stroke_width(theme.stroke(1.0));
            for (i, (_, s)) in boxes.iter().enumerate() {
                let x = i as f64;
                let fill = if grouped { theme.color(i) } else { theme.color(0) };
                let (half, cap) = (0.4, 0.2);

                chart.draw_series([
                    Rectangle::new([(x - half, s.q1), (x + half, s.q3)], fill.filled()),
                    Rectangle::new([(x - half, s.q1), (x + half, s.q3)], edge),
                ])?;
                chart.draw_series([
                    PathElement::new(vec![(x - half, s.median), (x + half, s.median)], edge),
                    PathElement::new(vec![(x, s.q1), (x, s.whisker_low)], edge),
                    PathElement::new(vec![(x, s.q3), (x, s.whisker_high)], edge),
                    PathElement::new(vec![(x - cap, s.whisker_low), (x + cap, s.whisker_low)], edge),
                    PathElement::new(vec![(x - cap, s.whisker_high), (x + cap, s.whisker_high)], edge),
                ])?;
                chart.draw_series(
                    s.outliers
                        .iter()
                        .map(|&v| Circle::new((x, v), theme.marker(5.0), edge)),
                )?;
            }
            Ok(())
        })
    }
}
