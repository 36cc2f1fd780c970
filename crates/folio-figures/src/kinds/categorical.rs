//! Bar, pie and multi-panel bar charts

use std::f64::consts::PI;

use folio_common::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};

use super::distribution::group_by_label;
use super::{panel_grid, Canvas, ChartHandler, Drawn, Labels};
use crate::axes::{self, Frame, Ticks};
use crate::data::{NamedSeries, Table};
use crate::figure::FigureSize;
use crate::palette::{self, contrast_text};
use crate::stats;

/// Mean of a numeric column per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    /// Source table
    pub table: Table,
    /// Category column
    pub x: String,
    /// Numeric column
    pub y: String,
}

impl ChartHandler for BarChart {
    fn labels(&self) -> Labels {
        Labels::new(format!("{} by {}", self.y, self.x))
            .x(self.x.clone())
            .y(self.y.clone())
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let (Some(x_col), Some(y_col)) = (self.table.column(&self.x), self.table.column(&self.y))
        else {
            let missing = self.table.missing_columns(&[&self.x, &self.y]);
            return canvas.skip(format!(
                "Columns not found for bar chart: {}",
                missing.join(", ")
            ));
        };

        let bars: Vec<(String, f64)> = group_by_label(&x_col.cells, &y_col.cells)
            .into_iter()
            .filter_map(|(label, values)| stats::mean(&values).map(|m| (label, m)))
            .collect();
        if bars.is_empty() {
            return canvas.skip(format!(
                "No numeric data available to plot '{}' by '{}'.",
                self.y, self.x
            ));
        }

        let (lo, hi) = stats::extent(bars.iter().map(|b| b.1)).unwrap_or((0.0, 1.0));
        let y_range = axes::padded(lo.min(0.0), hi.max(0.0), 0.05);
        let ticks = Ticks::Categories(bars.iter().map(|b| b.0.clone()).collect());

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .x_ticks(ticks)
                .without_x_grid()
                .build(root, theme, axes::category_range(bars.len()), y_range)?;

            chart.draw_series(bars.iter().enumerate().map(|(i, (_, mean))| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *mean)], theme.color(i).filled())
            }))?;
            Ok(())
        })
    }
}

fn default_start_angle() -> f64 {
    140.0
}

/// Shares of a whole as wedges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieChart {
    /// Wedge magnitudes
    pub values: Vec<f64>,
    /// Wedge names, parallel to `values`
    pub labels: Vec<String>,
    /// Draw a side legend instead of wedge labels
    #[serde(default)]
    pub legend: bool,
    /// Angle of the first wedge edge in degrees, counterclockwise from east
    #[serde(default = "default_start_angle")]
    pub start_angle: f64,
}

impl PieChart {
    /// Pie of `values` named by `labels`
    pub fn new<S: Into<String>>(values: Vec<f64>, labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            values,
            labels: labels.into_iter().map(Into::into).collect(),
            legend: false,
            start_angle: default_start_angle(),
        }
    }
}

struct Wedge {
    label: String,
    share: f64,
    from: f64,
    to: f64,
}

impl Wedge {
    /// Boundary polygon in pixels, sampled every degree or so
    fn polygon(&self, center: (i32, i32), radius: f64) -> Vec<(i32, i32)> {
        let steps = ((self.to - self.from).abs() * 180.0 / PI).ceil().max(2.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for k in 0..=steps {
            let a = self.from + (self.to - self.from) * k as f64 / steps as f64;
            points.push(polar(center, radius, a));
        }
        points
    }

    fn mid(&self) -> f64 {
        (self.from + self.to) / 2.0
    }
}

/// Pixel position at `radius` and angle `a` (radians, counterclockwise)
fn polar(center: (i32, i32), radius: f64, a: f64) -> (i32, i32) {
    (
        center.0 + (radius * a.cos()).round() as i32,
        center.1 - (radius * a.sin()).round() as i32,
    )
}

/// Wedges counterclockwise from `start_angle`, skipping zero shares
fn wedges(values: &[f64], labels: &[String], start_angle: f64) -> Vec<Wedge> {
    let total: f64 = values.iter().filter(|v| v.is_finite() && **v > 0.0).sum();
    let mut angle = start_angle.to_radians();
    let mut out = Vec::new();
    for (value, label) in values.iter().zip(labels) {
        if !(value.is_finite() && *value > 0.0) {
            continue;
        }
        let share = value / total;
        let to = angle + share * 2.0 * PI;
        out.push(Wedge {
            label: label.clone(),
            share,
            from: angle,
            to,
        });
        angle = to;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NotePlace {
    Inside,
    Outside,
}

/// Text written on or beside a wedge
#[derive(Debug, Clone, PartialEq)]
struct WedgeNote {
    wedge: usize,
    text: String,
    place: NotePlace,
}

/// Percentages always sit inside the wedges; names go outside unless the
/// legend carries them
fn wedge_notes(wedges: &[Wedge], legend: bool) -> Vec<WedgeNote> {
    let mut notes = Vec::with_capacity(wedges.len() * 2);
    for (i, wedge) in wedges.iter().enumerate() {
        notes.push(WedgeNote {
            wedge: i,
            text: format!("{:.1}%", wedge.share * 100.0),
            place: NotePlace::Inside,
        });
        if !legend {
            notes.push(WedgeNote {
                wedge: i,
                text: wedge.label.clone(),
                place: NotePlace::Outside,
            });
        }
    }
    notes
}

impl ChartHandler for PieChart {
    fn labels(&self) -> Labels {
        Labels::new("Pie Chart")
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        FigureSize::new(10.0, 10.0)
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        if self.values.len() != self.labels.len() {
            return canvas.skip(format!(
                "Pie chart needs one label per value ({} values, {} labels).",
                self.values.len(),
                self.labels.len()
            ));
        }
        if self.values.iter().any(|v| v.is_finite() && *v < 0.0) {
            return canvas.skip("Pie chart values must not be negative.");
        }
        let wedges = wedges(&self.values, &self.labels, self.start_angle);
        if wedges.is_empty() {
            return canvas.skip("No positive values available for pie chart.");
        }
        let legend = self.legend;

        canvas.paint(|root, theme, labels| {
            let body = match labels.title().filter(|_| theme.text) {
                Some(title) => root.titled(title, theme.title_font())?,
                None => root.clone(),
            };
            let (w, h) = body.dim_in_pixel();
            // Legend mode reserves the right side for the key.
            let pie_w = if legend { w * 7 / 10 } else { w };
            let center = ((pie_w / 2) as i32, (h / 2) as i32);
            let radius = f64::from(pie_w.min(h)) * 0.38;

            for (i, wedge) in wedges.iter().enumerate() {
                let color = theme.color(i);
                body.draw(&Polygon::new(wedge.polygon(center, radius), color.filled()))?;
                body.draw(&PathElement::new(
                    vec![center, polar(center, radius, wedge.from)],
                    WHITE.stroke_width(theme.stroke(1.0)),
                ))?;
            }

            if !theme.text {
                return Ok(());
            }

            if legend {
                let font = theme.label_font();
                let line = theme.px(18.0) as i32;
                let x0 = pie_w as i32 + theme.px(6.0) as i32;
                let y0 = center.1 - line * (wedges.len() as i32 + 1) / 2;
                body.draw(&Text::new("Categories", (x0, y0), theme.font(12.0)))?;
                for (i, wedge) in wedges.iter().enumerate() {
                    let y = y0 + line * (i as i32 + 1);
                    let swatch = theme.px(10.0) as i32;
                    body.draw(&Rectangle::new(
                        [(x0, y), (x0 + swatch, y + swatch)],
                        theme.color(i).filled(),
                    ))?;
                    body.draw(&Text::new(
                        wedge.label.clone(),
                        (x0 + swatch + theme.px(4.0) as i32, y),
                        font.clone(),
                    ))?;
                }
            }

            let anchor = Pos::new(HPos::Center, VPos::Center);
            for note in wedge_notes(&wedges, legend) {
                let ink = contrast_text(theme.color(note.wedge));
                let (radius_frac, style) = match note.place {
                    NotePlace::Inside => (0.6, theme.tick_font().color(&ink).pos(anchor)),
                    NotePlace::Outside => (1.12, theme.label_font().pos(anchor)),
                };
                body.draw(&Text::new(
                    note.text,
                    polar(center, radius * radius_frac, wedges[note.wedge].mid()),
                    style,
                ))?;
            }
            Ok(())
        })
    }
}

/// One bar panel per metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBarChart {
    /// Metric name and its per-category values
    pub metrics: Vec<NamedSeries>,
}

const MULTI_BAR_COLORS: [&str; 6] = ["red", "blue", "green", "orange", "purple", "brown"];

impl ChartHandler for MultiBarChart {
    fn labels(&self) -> Labels {
        Labels::untitled()
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        FigureSize::new(15.0, 10.0)
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        if self.metrics.is_empty() {
            return canvas.skip("No metrics supplied for multi-bar chart.");
        }
        let colors = palette::named(&MULTI_BAR_COLORS);
        let titles = self.metrics.iter().map(|m| m.label.clone()).collect();

        canvas.panel_titles(titles).paint(|root, theme, labels| {
            let panels = panel_grid(root, theme, labels.title(), self.metrics.len(), 2)?;
            for (metric, panel) in self.metrics.iter().zip(&panels) {
                let series = &metric.series;
                let n = series.len();
                let ticks = Ticks::Categories((0..n).map(|i| series.label_at(i)).collect());
                let (lo, hi) = stats::extent(series.values.iter().copied()).unwrap_or((0.0, 1.0));
                let y_label = labels.y_label().unwrap_or(metric.label.as_str());

                let mut chart = Frame::new()
                    .caption(Some(metric.label.as_str()))
                    .y_desc(Some(y_label))
                    .x_ticks(ticks)
                    .without_x_grid()
                    .build(
                        panel,
                        theme,
                        axes::category_range(n),
                        axes::padded(lo.min(0.0), hi.max(0.0), 0.05),
                    )?;

                chart.draw_series(
                    series
                        .values
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| v.is_finite())
                        .map(|(i, v)| {
                            let x = i as f64;
                            let color = colors[i % colors.len()];
                            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], color.filled())
                        }),
                )?;
            }
            Ok(())
        })
    }
}
