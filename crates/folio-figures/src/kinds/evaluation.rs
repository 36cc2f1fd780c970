//! Model evaluation charts: ROC curve, training history and residuals

use folio_common::Result;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use super::{panel_grid, Canvas, ChartHandler, Drawn, Labels};
use crate::axes::{self, Frame};
use crate::data::{NamedSeries, Series, TrainingHistory};
use crate::figure::FigureSize;
use crate::palette::{self, resolve_color};
use crate::stats;

/// Receiver operating characteristic of a binary classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurveChart {
    /// True binary labels
    pub labels: Vec<i64>,
    /// Scores, higher meaning more likely positive
    pub scores: Vec<f64>,
}

impl ChartHandler for RocCurveChart {
    fn labels(&self) -> Labels {
        Labels::new("ROC Curve")
            .x("False Positive Rate")
            .y("True Positive Rate")
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let roc = match stats::roc_curve(&self.labels, &self.scores) {
            Ok(roc) => roc,
            Err(e) => return canvas.skip(format!("Cannot draw ROC curve: {e}")),
        };
        tracing::debug!("ROC curve with {} thresholds, AUC {:.4}", roc.fpr.len(), roc.auc);

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .build(root, theme, 0.0..1.0, 0.0..1.05)?;

            let orange = resolve_color("darkorange").unwrap_or(RGBColor(255, 140, 0));
            let navy = resolve_color("navy").unwrap_or(RGBColor(0, 0, 128));

            let curve = orange.stroke_width(theme.stroke(2.0));
            chart
                .draw_series(LineSeries::new(
                    roc.fpr.iter().copied().zip(roc.tpr.iter().copied()),
                    curve,
                ))?
                .label(format!("ROC curve (area = {:.2})", roc.auc))
                .legend(axes::line_swatch(curve, theme));

            let diagonal = navy.stroke_width(theme.stroke(2.0));
            chart.draw_series(DashedLineSeries::new(
                vec![(0.0, 0.0), (1.0, 1.0)],
                theme.px(6.0),
                theme.px(4.0),
                diagonal,
            ))?;

            axes::draw_legend(&mut chart, theme, SeriesLabelPosition::LowerRight)
        })
    }
}

/// Loss per epoch from a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistoryChart {
    /// Per-epoch metrics
    pub history: TrainingHistory,
}

impl ChartHandler for TrainingHistoryChart {
    fn labels(&self) -> Labels {
        Labels::new("Model Training History").x("Epoch").y("Loss")
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        let Some(loss) = self.history.loss().filter(|l| !l.is_empty()) else {
            return canvas.skip("Training history has no 'loss' values.");
        };
        let curves: Vec<(&str, Series)> = std::iter::once(("Training Loss", loss))
            .chain(
                self.history
                    .val_loss()
                    .filter(|v| !v.is_empty())
                    .map(|v| ("Validation Loss", v)),
            )
            .map(|(name, values)| (name, Series::new(values.to_vec())))
            .collect();

        let epochs = curves.iter().map(|(_, s)| s.len()).max().unwrap_or(1);
        let y_range = axes::data_range(curves.iter().flat_map(|(_, s)| s.present()), 0.05);

        canvas.paint(|root, theme, labels| {
            let mut chart = Frame::new()
                .caption(labels.title())
                .x_desc(labels.x_label())
                .y_desc(labels.y_label())
                .build(root, theme, axes::padded(0.0, epochs.saturating_sub(1) as f64, 0.02), y_range)?;

            for (i, (name, series)) in curves.iter().enumerate() {
                let style = theme.color(i).stroke_width(theme.stroke(1.5));
                axes::draw_broken_line(&mut chart, theme, &series.points(), style, None, Some(*name))?;
            }

            axes::draw_legend(&mut chart, theme, SeriesLabelPosition::UpperRight)
        })
    }
}

const ERROR_COLORS: [&str; 5] = ["red", "green", "blue", "orange", "purple"];

/// Residuals of one or more forecasting models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionErrorsChart {
    /// Model name and its residual series
    pub models: Vec<NamedSeries>,
}

impl ChartHandler for PredictionErrorsChart {
    fn labels(&self) -> Labels {
        Labels::new("Prediction Errors").x("Date").y("Error")
    }

    fn figure_size(&self, _default: FigureSize) -> FigureSize {
        if self.models.len() <= 1 {
            FigureSize::new(10.0, 6.0)
        } else {
            FigureSize::new(15.0, 6.0)
        }
    }

    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn> {
        if self.models.is_empty() {
            return canvas.skip("No models supplied for prediction errors.");
        }
        let cols = if self.models.len() == 1 { 1 } else { 2 };
        let colors = palette::named(&ERROR_COLORS);
        let titles: Vec<String> = self
            .models
            .iter()
            .map(|m| format!("{} Prediction Errors", m.label))
            .collect();

        canvas.panel_titles(titles.clone()).paint(|root, theme, labels| {
            let panels = panel_grid(root, theme, labels.title(), self.models.len(), cols)?;
            for (i, ((model, title), panel)) in
                self.models.iter().zip(&titles).zip(&panels).enumerate()
            {
                let series = &model.series;
                let points = series.points();
                let x_range =
                    axes::data_range(points.iter().flatten().map(|p| p.0), 0.01);
                let y_range = axes::data_range(
                    series.present().into_iter().chain(std::iter::once(0.0)),
                    0.05,
                );

                let mut chart = Frame::new()
                    .caption(Some(title.as_str()))
                    .x_desc(labels.x_label())
                    .y_desc(labels.y_label())
                    .x_ticks(axes::index_ticks(series))
                    .build(panel, theme, x_range, y_range)?;

                let style = colors[i % colors.len()].stroke_width(theme.stroke(1.0));
                let label = format!("{} Errors", model.label);
                axes::draw_broken_line(&mut chart, theme, &points, style, None, Some(label.as_str()))?;

                let zero = BLACK.mix(0.5).stroke_width(theme.stroke(1.0));
                axes::draw_hline(&mut chart, 0.0, zero, theme.px(5.0))?;
                axes::draw_legend(&mut chart, theme, SeriesLabelPosition::UpperRight)?;
            }
            Ok(())
        })
    }
}
