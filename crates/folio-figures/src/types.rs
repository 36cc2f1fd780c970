//! Chart requests and render outcomes

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::kinds::categorical::{BarChart, MultiBarChart, PieChart};
use crate::kinds::distribution::{BoxChart, DensityChart, HistogramChart};
use crate::kinds::evaluation::{PredictionErrorsChart, RocCurveChart, TrainingHistoryChart};
use crate::kinds::matrix::{ConfusionMatrixChart, HeatmapChart};
use crate::kinds::series::{
    AcfPacfChart, MultiLineChart, OutlierGridChart, ScatterOverlayChart, SeasonalChart,
    TimeSeriesChart,
};
use crate::kinds::ChartHandler;

/// Every supported chart kind with its input data and options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    /// Binned counts of one numeric column with a density overlay
    Histogram(HistogramChart),
    /// Mean of a numeric column per category
    Bar(BarChart),
    /// Shares of a whole
    Pie(PieChart),
    /// One value column against a date column
    TimeSeries(TimeSeriesChart),
    /// Tukey box per group
    #[serde(rename = "box")]
    BoxPlot(BoxChart),
    /// Coloured matrix with a colour bar
    Heatmap(HeatmapChart),
    /// One density curve per class
    Density(DensityChart),
    /// Classifier ROC curve with AUC
    RocCurve(RocCurveChart),
    /// True versus predicted label counts
    ConfusionMatrix(ConfusionMatrixChart),
    /// Scatter and line layers on shared axes
    ScatterOverlay(ScatterOverlayChart),
    /// Grid of return panels with outliers marked
    OutlierGrid(OutlierGridChart),
    /// Autocorrelation and partial autocorrelation side by side
    AcfPacf(AcfPacfChart),
    /// Loss curves per epoch
    TrainingHistory(TrainingHistoryChart),
    /// Residuals per model
    PredictionErrors(PredictionErrorsChart),
    /// Several series on one axes
    MultiLine(MultiLineChart),
    /// Observed, trend, seasonal and residual panels
    SeasonalDecomposition(SeasonalChart),
    /// Grid of bar panels, one per metric
    MultiBar(MultiBarChart),
}

impl Chart {
    /// Serialized kind name, used in log lines
    pub fn kind_name(&self) -> &'static str {
        match self {
            Chart::Histogram(_) => "histogram",
            Chart::Bar(_) => "bar",
            Chart::Pie(_) => "pie",
            Chart::TimeSeries(_) => "time_series",
            Chart::BoxPlot(_) => "box",
            Chart::Heatmap(_) => "heatmap",
            Chart::Density(_) => "density",
            Chart::RocCurve(_) => "roc_curve",
            Chart::ConfusionMatrix(_) => "confusion_matrix",
            Chart::ScatterOverlay(_) => "scatter_overlay",
            Chart::OutlierGrid(_) => "outlier_grid",
            Chart::AcfPacf(_) => "acf_pacf",
            Chart::TrainingHistory(_) => "training_history",
            Chart::PredictionErrors(_) => "prediction_errors",
            Chart::MultiLine(_) => "multi_line",
            Chart::SeasonalDecomposition(_) => "seasonal_decomposition",
            Chart::MultiBar(_) => "multi_bar",
        }
    }

    pub(crate) fn handler(&self) -> &dyn ChartHandler {
        match self {
            Chart::Histogram(c) => c,
            Chart::Bar(c) => c,
            Chart::Pie(c) => c,
            Chart::TimeSeries(c) => c,
            Chart::BoxPlot(c) => c,
            Chart::Heatmap(c) => c,
            Chart::Density(c) => c,
            Chart::RocCurve(c) => c,
            Chart::ConfusionMatrix(c) => c,
            Chart::ScatterOverlay(c) => c,
            Chart::OutlierGrid(c) => c,
            Chart::AcfPacf(c) => c,
            Chart::TrainingHistory(c) => c,
            Chart::PredictionErrors(c) => c,
            Chart::MultiLine(c) => c,
            Chart::SeasonalDecomposition(c) => c,
            Chart::MultiBar(c) => c,
        }
    }
}

macro_rules! chart_from {
    ($($variant:ident($spec:ty)),+ $(,)?) => {
        $(
            impl From<$spec> for Chart {
                fn from(spec: $spec) -> Self {
                    Chart::$variant(spec)
                }
            }
        )+
    };
}

chart_from!(
    Histogram(HistogramChart),
    Bar(BarChart),
    Pie(PieChart),
    TimeSeries(TimeSeriesChart),
    BoxPlot(BoxChart),
    Heatmap(HeatmapChart),
    Density(DensityChart),
    RocCurve(RocCurveChart),
    ConfusionMatrix(ConfusionMatrixChart),
    ScatterOverlay(ScatterOverlayChart),
    OutlierGrid(OutlierGridChart),
    AcfPacf(AcfPacfChart),
    TrainingHistory(TrainingHistoryChart),
    PredictionErrors(PredictionErrorsChart),
    MultiLine(MultiLineChart),
    SeasonalDecomposition(SeasonalChart),
    MultiBar(MultiBarChart),
);

/// One rendering call: what to draw plus optional label overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    /// Chart kind and data
    pub chart: Chart,
    /// Title shown on the figure and used to name the saved file
    #[serde(default)]
    pub title: Option<String>,
    /// x axis description override
    #[serde(default)]
    pub x_label: Option<String>,
    /// y axis description override
    #[serde(default)]
    pub y_label: Option<String>,
}

impl ChartRequest {
    /// Request with the kind's default labels
    pub fn new(chart: impl Into<Chart>) -> Self {
        Self {
            chart: chart.into(),
            title: None,
            x_label: None,
            y_label: None,
        }
    }

    /// Set the title
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the x axis description
    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }

    /// Set the y axis description
    pub fn with_y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }
}

/// What a render call did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// The figure was drawn and displayed, and saved when titled
    Rendered {
        /// Output file, when one was written
        saved: Option<PathBuf>,
    },
    /// Input was unusable; nothing was drawn or saved
    Skipped {
        /// Diagnostic message
        reason: String,
    },
}

impl RenderOutcome {
    /// Path of the written file, if any
    pub fn saved_path(&self) -> Option<&Path> {
        match self {
            RenderOutcome::Rendered { saved } => saved.as_deref(),
            RenderOutcome::Skipped { .. } => None,
        }
    }

    /// True when the input was rejected
    pub fn is_skipped(&self) -> bool {
        matches!(self, RenderOutcome::Skipped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "title": "Revenue Growth (%)",
            "chart": {
                "kind": "histogram",
                "table": {"columns": [{"name": "growth", "cells": [1.5, "2.0", null, "n/a"]}]},
                "column": "growth"
            }
        }"#;
        let request: ChartRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.title.as_deref(), Some("Revenue Growth (%)"));
        assert_eq!(request.chart.kind_name(), "histogram");

        let Chart::Histogram(h) = &request.chart else {
            panic!("expected a histogram");
        };
        assert_eq!(h.bins, 20);
        assert!(!h.log_scale);
        assert_eq!(h.table.numeric("growth"), Some(vec![1.5, 2.0]));
    }

    #[test]
    fn test_request_from_yaml() {
        let yaml = r#"
chart:
  kind: roc_curve
  labels: [0, 1, 1, 0]
  scores: [0.1, 0.9, 0.8, 0.2]
"#;
        let request: ChartRequest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(request.chart.kind_name(), "roc_curve");
        assert!(request.title.is_none());
    }

    #[test]
    fn test_outcome_accessors() {
        let rendered = RenderOutcome::Rendered {
            saved: Some(PathBuf::from("/tmp/a.png")),
        };
        assert_eq!(rendered.saved_path(), Some(Path::new("/tmp/a.png")));
        assert!(!rendered.is_skipped());

        let skipped = RenderOutcome::Skipped {
            reason: "empty".into(),
        };
        assert!(skipped.is_skipped());
        assert_eq!(skipped.saved_path(), None);
    }
}
