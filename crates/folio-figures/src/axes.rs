//! Cartesian axes framing shared by the chart kinds

use std::ops::Range;

use chrono::NaiveDate;
use folio_common::Result;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::data::{Series, SeriesIndex};
use crate::figure::Area;
use crate::theme::Theme;

/// Chart context over an `f64` x `f64` plane
pub(crate) type Plot<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// How tick values along an axis are labelled
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum Ticks {
    /// Plain numbers
    #[default]
    Numeric,
    /// Values are days since the common era
    Dates,
    /// Integer positions name categories
    Categories(Vec<String>),
    /// Values went through [`symlog`]
    SymLog,
    /// No tick labels
    Hidden,
}

impl Ticks {
    fn count(&self) -> usize {
        match self {
            Ticks::Numeric | Ticks::SymLog => 8,
            Ticks::Dates => 6,
            Ticks::Categories(labels) => labels.len().max(1),
            Ticks::Hidden => 0,
        }
    }

    fn formatter(&self) -> Box<dyn Fn(&f64) -> String + '_> {
        match self {
            Ticks::Numeric | Ticks::Hidden => Box::new(|v| format_tick(*v)),
            Ticks::Dates => Box::new(|v| {
                NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            }),
            Ticks::Categories(labels) => Box::new(move |v| {
                let i = v.round();
                if (v - i).abs() < 1e-6 && i >= 0.0 {
                    labels.get(i as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            }),
            Ticks::SymLog => Box::new(|v| format_tick(symlog_inverse(*v))),
        }
    }
}

fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a == 0.0 {
        "0".to_string()
    } else if !(1e-3..1e6).contains(&a) {
        format!("{v:.1e}")
    } else if v.fract().abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Tick style matching a series index
pub(crate) fn index_ticks(series: &Series) -> Ticks {
    match &series.index {
        SeriesIndex::Dates(_) => Ticks::Dates,
        SeriesIndex::Labels(labels) => Ticks::Categories(labels.clone()),
        SeriesIndex::Positional => Ticks::Numeric,
    }
}

/// Symmetric log transform: linear near zero, logarithmic beyond one
pub(crate) fn symlog(v: f64) -> f64 {
    v.signum() * (1.0 + v.abs()).log10()
}

/// Inverse of [`symlog`]
pub(crate) fn symlog_inverse(t: f64) -> f64 {
    t.signum() * (10f64.powf(t.abs()) - 1.0)
}

/// Data range padded by `frac` of its width, never empty or non-finite
pub(crate) fn padded(lo: f64, hi: f64, frac: f64) -> Range<f64> {
    if !(lo.is_finite() && hi.is_finite()) {
        return 0.0..1.0;
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if (hi - lo).abs() < f64::EPSILON {
        let pad = if lo.abs() > f64::EPSILON { lo.abs() * 0.05 } else { 0.5 };
        return (lo - pad)..(hi + pad);
    }
    let pad = (hi - lo) * frac;
    (lo - pad)..(hi + pad)
}

/// Padded extent of all finite values, or `0..1` when there are none
pub(crate) fn data_range(values: impl IntoIterator<Item = f64>, frac: f64) -> Range<f64> {
    match crate::stats::extent(values) {
        Some((lo, hi)) => padded(lo, hi, frac),
        None => 0.0..1.0,
    }
}

/// Range for `n` categories centred on integer positions
pub(crate) fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Split points into contiguous runs, breaking at missing entries
pub(crate) fn runs(points: &[Option<(f64, f64)>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for p in points {
        match p {
            Some(p) => current.push(*p),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Caption, axis descriptions and tick styles for one set of axes
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame<'s> {
    caption: Option<&'s str>,
    x_desc: Option<&'s str>,
    y_desc: Option<&'s str>,
    x_ticks: Ticks,
    y_ticks: Ticks,
    x_grid: bool,
    y_grid: bool,
}

impl<'s> Frame<'s> {
    pub fn new() -> Self {
        Self {
            x_grid: true,
            y_grid: true,
            ..Default::default()
        }
    }

    pub fn caption(mut self, caption: Option<&'s str>) -> Self {
        self.caption = caption.filter(|c| !c.is_empty());
        self
    }

    pub fn x_desc(mut self, desc: Option<&'s str>) -> Self {
        self.x_desc = desc.filter(|d| !d.is_empty());
        self
    }

    pub fn y_desc(mut self, desc: Option<&'s str>) -> Self {
        self.y_desc = desc.filter(|d| !d.is_empty());
        self
    }

    pub fn x_ticks(mut self, ticks: Ticks) -> Self {
        self.x_ticks = ticks;
        self
    }

    pub fn y_ticks(mut self, ticks: Ticks) -> Self {
        self.y_ticks = ticks;
        self
    }

    pub fn without_grid(mut self) -> Self {
        self.x_grid = false;
        self.y_grid = false;
        self
    }

    pub fn without_x_grid(mut self) -> Self {
        self.x_grid = false;
        self
    }

    /// Build the chart on `area` and draw its mesh
    pub fn build<'a, 'b>(
        &self,
        area: &'a Area<'b>,
        theme: &Theme,
        x: Range<f64>,
        y: Range<f64>,
    ) -> Result<Plot<'a, 'b>> {
        let mut builder = ChartBuilder::on(area);
        builder.margin(theme.px(8.0));

        if theme.text {
            if let Some(caption) = self.caption {
                builder.caption(caption, theme.title_font());
            }
            let x_area = if self.x_desc.is_some() { 34.0 } else { 20.0 };
            let y_area = if self.y_desc.is_some() { 52.0 } else { 38.0 };
            builder
                .x_label_area_size(theme.px(x_area))
                .y_label_area_size(theme.px(y_area));
        } else {
            builder
                .x_label_area_size(theme.px(4.0))
                .y_label_area_size(theme.px(4.0));
        }

        let mut chart = builder.build_cartesian_2d(x, y)?;

        let x_fmt = self.x_ticks.formatter();
        let y_fmt = self.y_ticks.formatter();
        {
            let mut mesh = chart.configure_mesh();
            mesh.light_line_style(RGBColor(235, 235, 235))
                .bold_line_style(RGBColor(215, 215, 215))
                .axis_style(BLACK.stroke_width(theme.stroke(0.8)));

            if !self.x_grid {
                mesh.disable_x_mesh();
            }
            if !self.y_grid {
                mesh.disable_y_mesh();
            }

            if theme.text {
                mesh.label_style(theme.tick_font())
                    .axis_desc_style(theme.label_font())
                    .x_labels(self.x_ticks.count())
                    .y_labels(self.y_ticks.count())
                    .x_label_formatter(&*x_fmt)
                    .y_label_formatter(&*y_fmt);
                if let Some(desc) = self.x_desc {
                    mesh.x_desc(desc);
                }
                if let Some(desc) = self.y_desc {
                    mesh.y_desc(desc);
                }
            } else {
                mesh.x_labels(0).y_labels(0);
            }

            mesh.draw()?;
        }

        Ok(chart)
    }
}

/// Draw the series legend when text is available
pub(crate) fn draw_legend<'a, 'b: 'a>(
    chart: &mut Plot<'a, 'b>,
    theme: &Theme,
    position: SeriesLabelPosition,
) -> Result<()> {
    if !theme.text {
        return Ok(());
    }
    chart
        .configure_series_labels()
        .position(position)
        .margin(theme.px(6.0))
        .legend_area_size(theme.px(18.0))
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK.mix(0.3))
        .label_font(theme.label_font())
        .draw()?;
    Ok(())
}

/// Horizontal dashed reference line across the current x range
pub(crate) fn draw_hline(chart: &mut Plot<'_, '_>, y: f64, style: ShapeStyle, dash: u32) -> Result<()> {
    let xr = chart.x_range();
    chart.draw_series(DashedLineSeries::new(
        vec![(xr.start, y), (xr.end, y)],
        dash,
        dash / 2 + 1,
        style,
    ))?;
    Ok(())
}

/// Draw `points` as a line broken at missing entries. Only the first run
/// carries the legend entry. `dash` gives the dash length in pixels.
pub(crate) fn draw_broken_line(
    chart: &mut Plot<'_, '_>,
    theme: &Theme,
    points: &[Option<(f64, f64)>],
    style: ShapeStyle,
    dash: Option<u32>,
    label: Option<&str>,
) -> Result<()> {
    for (i, run) in runs(points).into_iter().enumerate() {
        let mut anno = match dash {
            Some(d) => chart.draw_series(DashedLineSeries::new(run, d, d / 2 + 1, style))?,
            None => chart.draw_series(LineSeries::new(run, style))?,
        };
        if let (0, Some(label)) = (i, label) {
            anno.label(label).legend(line_swatch(style, theme));
        }
    }
    Ok(())
}

/// Legend swatch: a short horizontal stroke
pub(crate) fn line_swatch(style: ShapeStyle, theme: &Theme) -> impl Fn((i32, i32)) -> PathElement<(i32, i32)> {
    let len = theme.px(14.0) as i32;
    move |(x, y)| PathElement::new(vec![(x, y), (x + len, y)], style)
}
