//! Time-indexed charts: single series, overlays, return grids,
//! autocorrelation and seasonal decomposition

use chrono::NaiveDate;
use folio_common::Result;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{panel_grid, Canvas, ChartHandler, Drawn, Labels};
use crate::axes::{self, Frame, Plot, Ticks};
use crate::data::{Decomposition, NamedSeries, Series, Table};
use crate::figure::FigureSize;
use crate::palette::resolve_color;
use crate::stats;
use crate::theme::Theme;

/// Parse `YYYY-MM-DD`, ignoring any time part
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let day = text.split(['T', ' ']).next().unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Shared x ticks for several series: dates if any is dated
fn shared_ticks<'s>(series: impl IntoIterator<Item = &'s Series>) -> Ticks {
    let mut first = None;
    for s in series {
        if s.is_dated() {
            return Ticks::Dates;
        }
        first.get_or_insert(s);
    }
    first.map(axes::index_ticks).unwrap_or_default()
}

/// One value column plotted against a date column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesChart {
    /// Source table
    pub table: Table,
    /// Column of `YYYY-MM-DD` dates
    pub date_col: String,
    /// Numeric column
    pub value_col: String,
}

impl TimeSeriesChart {
    /// Rows with a valid date and value, sorted by date
    fn rows(&self) -> Option<Vec<(NaiveDate, f64)>> {
        let dates = self.table.column(&self.date_col)?;
        let values = self.table.column(&self.value_col)?;
        let mut rows: Vec<(NaiveDate, f64)> = dates
            .cells
            .iter()
            .zip(&values.cells)
            .filter_map(|(d, v)| Some((parse_date(&d.as_label()?)?, v.as_number()?)))
            .collect();
        rows.sort_by_key(|r| r.0);
        Some(rows)
    }
}

impl ChartHandler for TimeSeriesChart {
    fn labels(&self) -> Labels {
        Labels::new(format!("{} over Time", self.value_col))
            .x(self.date_col.clone())
            .y(self.value_col.clone())
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let Some(rows) = self.rows() else {
            let missing = self.table.missing_columns(&[&self.date_col, &self.value_col]);
            return canvas.skip(format!(
                "Columns not found for time series: {}",
                missing.join(", ")
            ));
        };
        if rows.is_empty() {
            return canvas.skip(format!(
                "No rows with a valid date and value for '{}'.",
                self.value_col
            ));
        }

        let (dates, values): (Vec<NaiveDate>, Vec<f64>) = rows.into_iter().unzip();
        let series = Series::dated(dates, values);
        let points = series.present_points();
        let x_range = axes::data_range(points.iter().map(|p| p.0), 0.02);
        let y_range = axes::data_range(points.iter().map(|p| p.1), 0.05);

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .x_ticks(Ticks::Dates)
                .build(root, theme, x_range, y_range)?;

            let color = theme.color(0);
            chart.draw_series(
                LineSeries::new(points.iter().copied(), color.stroke_width(theme.stroke(1.5)))
                    .point_size(theme.marker(4.0)),
            )?;
            Ok(())
        })
    }
}

/// Marker shape for scatter layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Filled dot
    #[serde(alias = "o")]
    Circle,
    /// Diagonal cross
    #[serde(alias = "x")]
    Cross,
    /// Filled square
    #[serde(alias = "s")]
    Square,
}

fn default_alpha() -> f64 {
    1.0
}

fn default_size() -> f64 {
    4.0
}

/// How one overlay layer is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    /// Colour name or `#RRGGBB`; palette colour when absent or unknown
    #[serde(default)]
    pub color: Option<String>,
    /// Marker shape; layers without one are drawn as lines
    #[serde(default)]
    pub marker: Option<Marker>,
    /// Dashed line (line layers only)
    #[serde(default)]
    pub dashed: bool,
    /// Opacity
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Marker diameter or line width in points
    #[serde(default = "default_size")]
    pub size: f64,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            color: None,
            marker: None,
            dashed: false,
            alpha: default_alpha(),
            size: default_size(),
        }
    }
}

/// One named layer of a scatter overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLayer {
    /// Legend entry
    pub label: String,
    /// Points of the layer
    pub series: Series,
    /// Drawing style
    #[serde(default)]
    pub style: LayerStyle,
}

/// Draw `points` as markers of `shape`
fn draw_markers<'a, 'b: 'a>(
    chart: &mut Plot<'a, 'b>,
    theme: &Theme,
    points: &[(f64, f64)],
    shape: Marker,
    color: RGBAColor,
    size: f64,
    label: &str,
) -> Result<()> {
    let r = theme.marker(size) as i32;
    let fill = color.filled();
    let line = color.stroke_width(theme.stroke(1.0));
    match shape {
        Marker::Circle => {
            chart
                .draw_series(points.iter().map(|&p| Circle::new(p, r, fill)))?
                .label(label)
                .legend(move |c| Circle::new(c, r, fill));
        }
        Marker::Cross => {
            chart
                .draw_series(points.iter().map(|&p| Cross::new(p, r, line)))?
                .label(label)
                .legend(move |c| Cross::new(c, r, line));
        }
        Marker::Square => {
            chart
                .draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p) + Rectangle::new([(-r, -r), (r, r)], fill)
                }))?
                .label(label)
                .legend(move |c| EmptyElement::at(c) + Rectangle::new([(-r, -r), (r, r)], fill));
        }
    }
    Ok(())
}

/// Scatter and line layers sharing one set of axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterOverlayChart {
    /// Layers in drawing order
    pub layers: Vec<OverlayLayer>,
}

impl ChartHandler for ScatterOverlayChart {
    fn labels(&self) -> Labels {
        Labels::new("Scatter Plot with Overlays").x("Date")
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        FigureSize::new(12.0, 6.0)
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        if self.layers.is_empty() {
            return canvas.skip("No layers supplied for scatter overlay.");
        }
        let points: Vec<Vec<Option<(f64, f64)>>> =
            self.layers.iter().map(|l| l.series.points()).collect();
        let present = || points.iter().flatten().flatten();
        if present().next().is_none() {
            return canvas.skip("Scatter overlay layers contain no values.");
        }
        let x_range = axes::data_range(present().map(|p| p.0), 0.02);
        let y_range = axes::data_range(present().map(|p| p.1), 0.05);
        let ticks = shared_ticks(self.layers.iter().map(|l| &l.series));

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .x_ticks(ticks)
                .build(root, theme, x_range, y_range)?;

            for (i, (layer, pts)) in self.layers.iter().zip(&points).enumerate() {
                let style = &layer.style;
                let base = style
                    .color
                    .as_deref()
                    .and_then(resolve_color)
                    .unwrap_or_else(|| theme.color(i));
                let color = base.mix(style.alpha.clamp(0.0, 1.0));

                match style.marker {
                    Some(shape) => {
                        let present: Vec<(f64, f64)> = pts.iter().flatten().copied().collect();
                        draw_markers(&mut chart, theme, &present, shape, color, style.size, &layer.label)?;
                    }
                    None => {
                        let line = color.stroke_width(theme.stroke(style.size / 2.0));
                        let dash = style.dashed.then(|| theme.px(6.0));
                        axes::draw_broken_line(&mut chart, theme, pts, line, dash, Some(layer.label.as_str()))?;
                    }
                }
            }

            axes::draw_legend(&mut chart, theme, SeriesLabelPosition::UpperLeft)
        })
    }
}

/// One return panel of an outlier grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierPanel {
    /// Asset name
    pub label: String,
    /// All daily returns
    pub returns: Series,
    /// Returns flagged by z-score
    #[serde(default)]
    pub outliers: Series,
    /// Returns beyond the extreme-move threshold
    #[serde(default)]
    pub extremes: Series,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnKind {
    Normal,
    Outlier,
    Extreme,
}

impl ReturnKind {
    fn label(self) -> &'static str {
        match self {
            ReturnKind::Normal => "Normal returns",
            ReturnKind::Outlier => "Outliers (z>3)",
            ReturnKind::Extreme => "Extreme (>5%)",
        }
    }

    fn marker(self) -> Marker {
        match self {
            ReturnKind::Extreme => Marker::Cross,
            _ => Marker::Circle,
        }
    }

    /// Marker areas of 1, 20 and 15 square points
    fn size(self) -> f64 {
        match self {
            ReturnKind::Normal => 1.0,
            ReturnKind::Outlier => 20f64.sqrt(),
            ReturnKind::Extreme => 15f64.sqrt(),
        }
    }
}

struct ReturnLayer {
    kind: ReturnKind,
    points: Vec<(f64, f64)>,
}

impl OutlierPanel {
    /// Marker layers to draw; flagged layers without points are left out
    /// so they get no legend entry
    fn layers(&self) -> Vec<ReturnLayer> {
        let mut layers = vec![ReturnLayer {
            kind: ReturnKind::Normal,
            points: self.returns.present_points(),
        }];
        for (kind, series) in [
            (ReturnKind::Outlier, &self.outliers),
            (ReturnKind::Extreme, &self.extremes),
        ] {
            let points = series.present_points();
            if !points.is_empty() {
                layers.push(ReturnLayer { kind, points });
            }
        }
        layers
    }
}

/// Grid of daily-return panels with outliers highlighted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierGridChart {
    /// Panels in reading order
    pub panels: Vec<OutlierPanel>,
}

impl ChartHandler for OutlierGridChart {
    fn labels(&self) -> Labels {
        Labels::untitled().y("Daily Return")
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        FigureSize::new(15.0, 10.0)
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        if self.panels.is_empty() {
            return canvas.skip("No return series supplied for outlier grid.");
        }
        let titles: Vec<String> = self
            .panels
            .iter()
            .map(|p| format!("{} Daily Returns with Outliers", p.label))
            .collect();

        canvas.panel_titles(titles.clone()).paint(|root, theme, labels| {
            let areas = panel_grid(root, theme, labels.title(), self.panels.len(), 2)?;
            let blue = resolve_color("blue").unwrap_or(BLUE);
            let red = resolve_color("red").unwrap_or(RED);
            let orange = resolve_color("orange").unwrap_or(RGBColor(255, 165, 0));

            for ((panel, title), area) in self.panels.iter().zip(&titles).zip(&areas) {
                let layers = panel.layers();
                let all = || layers.iter().flat_map(|l| l.points.iter());

                let mut chart = Frame::new()
                    .caption(Some(title.as_str()))
                    .x_desc(labels.x_label())
                    .y_desc(labels.y_label())
                    .x_ticks(shared_ticks([&panel.returns, &panel.outliers, &panel.extremes]))
                    .build(
                        area,
                        theme,
                        axes::data_range(all().map(|p| p.0), 0.02),
                        axes::data_range(all().map(|p| p.1), 0.05),
                    )?;

                for layer in &layers {
                    let (color, alpha) = match layer.kind {
                        ReturnKind::Normal => (blue, 0.6),
                        ReturnKind::Outlier => (red, 1.0),
                        ReturnKind::Extreme => (orange, 1.0),
                    };
                    draw_markers(
                        &mut chart,
                        theme,
                        &layer.points,
                        layer.kind.marker(),
                        color.mix(alpha),
                        layer.kind.size(),
                        layer.kind.label(),
                    )?;
                }
                axes::draw_legend(&mut chart, theme, SeriesLabelPosition::UpperRight)?;
            }
            Ok(())
        })
    }
}

fn default_lags() -> usize {
    50
}

fn default_series_prefix() -> String {
    "Time Series".to_string()
}

/// Autocorrelation and partial autocorrelation side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcfPacfChart {
    /// Input series; missing values are dropped
    pub series: Series,
    /// Largest lag
    #[serde(default = "default_lags")]
    pub lags: usize,
    /// Prefix of the saved file name
    #[serde(default = "default_series_prefix")]
    pub title_prefix: String,
}

impl AcfPacfChart {
    /// ACF/PACF of `series` with 50 lags
    pub fn new(series: Series) -> Self {
        Self {
            series,
            lags: default_lags(),
            title_prefix: default_series_prefix(),
        }
    }
}

/// Coefficients of one correlogram plus its confidence half-widths
struct Correlogram {
    title: &'static str,
    values: Vec<f64>,
    band: Vec<f64>,
}

impl Correlogram {
    fn draw(&self, area: &crate::figure::Area<'_>, theme: &Theme, x_desc: Option<&str>) -> Result<()> {
        let lags = self.values.len().saturating_sub(1) as f64;
        let y_range = axes::data_range(
            self.values
                .iter()
                .copied()
                .chain(self.band.iter().map(|b| -b))
                .chain([0.0, 1.0]),
            0.08,
        );
        let mut chart = Frame::new()
            .caption(Some(self.title))
            .x_desc(x_desc)
            .without_x_grid()
            .build(area, theme, -1.0..lags + 1.0, y_range)?;

        let color = theme.color(0);
        let band: Vec<(f64, f64)> = self
            .band
            .iter()
            .enumerate()
            .map(|(k, b)| (k as f64, *b))
            .collect();
        chart.draw_series(std::iter::once(Polygon::new(
            band.iter()
                .copied()
                .chain(band.iter().rev().map(|&(k, b)| (k, -b)))
                .collect::<Vec<_>>(),
            color.mix(0.2).filled(),
        )))?;

        let stem = color.stroke_width(theme.stroke(1.0));
        chart.draw_series(
            self.values
                .iter()
                .enumerate()
                .map(|(k, &r)| PathElement::new(vec![(k as f64, 0.0), (k as f64, r)], stem)),
        )?;
        chart.draw_series(
            self.values
                .iter()
                .enumerate()
                .map(|(k, &r)| Circle::new((k as f64, r), theme.marker(5.0), color.filled())),
        )?;
        chart.draw_series(LineSeries::new(vec![(-1.0, 0.0), (lags + 1.0, 0.0)], BLACK.stroke_width(1)))?;
        Ok(())
    }
}

impl ChartHandler for AcfPacfChart {
    fn labels(&self) -> Labels {
        let labels = Labels::untitled().x("Lag");
        if self.title_prefix.is_empty() {
            labels
        } else {
            labels.saved_as(format!("{} ACF PACF", self.title_prefix))
        }
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        FigureSize::new(15.0, 5.0)
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let values = self.series.present();
        let n = values.len();
        if n < 2 {
            return canvas.skip(format!(
                "Need at least 2 values for ACF/PACF, got {n}."
            ));
        }
        let (Some(acf), Some(pacf)) = (stats::acf(&values, self.lags), stats::pacf(&values, self.lags))
        else {
            return canvas.skip("Series is constant; autocorrelation is undefined.");
        };
        debug!("ACF over {} lags, PACF over {} lags", acf.len() - 1, pacf.len() - 1);

        let pacf_band: Vec<f64> = std::iter::once(0.0)
            .chain(std::iter::repeat(1.96 / (n as f64).sqrt()))
            .take(pacf.len())
            .collect();
        let panels = [
            Correlogram {
                title: "Autocorrelation Function (ACF)",
                band: stats::bartlett_band(&acf, n),
                values: acf,
            },
            Correlogram {
                title: "Partial Autocorrelation Function (PACF)",
                values: pacf,
                band: pacf_band,
            },
        ];
        let titles = panels.iter().map(|p| p.title.to_string()).collect();

        canvas.panel_titles(titles).paint(|root, theme, labels| {
            let areas = panel_grid(root, theme, labels.title(), panels.len(), 2)?;
            for (panel, area) in panels.iter().zip(&areas) {
                panel.draw(area, theme, labels.x_label())?;
            }
            Ok(())
        })
    }
}

/// Several series on one set of axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLineChart {
    /// Lines in drawing order
    pub lines: Vec<NamedSeries>,
}

impl ChartHandler for MultiLineChart {
    fn labels(&self) -> Labels {
        Labels::new("Multi-Line Time Series").x("Date")
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        FigureSize::new(12.0, 6.0)
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        if self.lines.is_empty() {
            return canvas.skip("No series supplied for multi-line chart.");
        }
        let points: Vec<Vec<Option<(f64, f64)>>> =
            self.lines.iter().map(|l| l.series.points()).collect();
        let present = || points.iter().flatten().flatten();
        let x_range = axes::data_range(present().map(|p| p.0), 0.02);
        let y_range = axes::data_range(present().map(|p| p.1), 0.05);
        let ticks = shared_ticks(self.lines.iter().map(|l| &l.series));

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .x_ticks(ticks)
                .build(root, theme, x_range, y_range)?;

            for (i, (line, pts)) in self.lines.iter().zip(&points).enumerate() {
                let style = theme.color(i).mix(0.8).stroke_width(theme.stroke(1.5));
                axes::draw_broken_line(&mut chart, theme, pts, style, None, Some(line.label.as_str()))?;
            }

            axes::draw_legend(&mut chart, theme, SeriesLabelPosition::UpperLeft)
        })
    }
}

fn default_ticker_prefix() -> String {
    "TSLA".to_string()
}

/// Observed, trend, seasonal and residual components stacked vertically
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalChart {
    /// Decomposition components
    pub decomposition: Decomposition,
    /// Asset name used in titles
    #[serde(default = "default_ticker_prefix")]
    pub title_prefix: String,
}

impl ChartHandler for SeasonalChart {
    fn labels(&self) -> Labels {
        Labels::new(format!("{} Seasonal Decomposition", self.title_prefix)).x("Date")
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        FigureSize::new(12.0, 8.0)
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let d = &self.decomposition;
        if d.observed.present().is_empty() {
            return canvas.skip("Decomposition has no observed values.");
        }
        let components = [&d.observed, &d.trend, &d.seasonal, &d.residual];
        let titles = vec![
            format!("{} Observed", self.title_prefix),
            "Trend".to_string(),
            "Seasonal".to_string(),
            "Residual".to_string(),
        ];
        let x_range = axes::data_range(
            components
                .iter()
                .flat_map(|s| s.present_points().into_iter().map(|p| p.0)),
            0.01,
        );
        let ticks = shared_ticks(components);

        canvas.panel_titles(titles.clone()).paint(|root, theme, labels| {
            let areas = panel_grid(root, theme, labels.title(), components.len(), 1)?;
            let last = components.len() - 1;
            for (i, ((series, title), area)) in components.iter().zip(&titles).zip(&areas).enumerate() {
                let points = series.points();
                let y_range = axes::data_range(points.iter().flatten().map(|p| p.1), 0.05);
                let mut chart = Frame::new()
                    .caption(Some(title.as_str()))
                    .x_desc(if i == last { labels.x_label() } else { None })
                    .x_ticks(if i == last { ticks.clone() } else { Ticks::Hidden })
                    .build(area, theme, x_range.clone(), y_range)?;

                let style = theme.color(0).stroke_width(theme.stroke(1.0));
                axes::draw_broken_line(&mut chart, theme, &points, style, None, None)?;
            }
            Ok(())
        })
    }
}
