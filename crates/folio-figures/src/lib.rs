//! # Folio Figures
//!
//! Chart rendering for folio-plot. A [`FigureRenderer`] takes a
//! [`ChartRequest`], draws it with plotters onto an in-memory figure,
//! saves titled figures as PNG under a slug of the title and hands every
//! finished figure to a [`FigureDisplay`].
//!
//! Input that cannot be charted (missing columns, empty data, mismatched
//! lengths) is reported as [`RenderOutcome::Skipped`] instead of an error.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub(crate) mod axes;
pub mod data;
pub mod display;
pub mod figure;
pub mod kinds;
pub mod palette;
pub mod renderer;
pub mod stats;
pub mod theme;
pub mod types;

pub use data::{Cell, Column, Decomposition, Matrix, NamedSeries, Series, SeriesIndex, Table, TrainingHistory};
pub use display::{FigureDisplay, LogDisplay, NullDisplay};
pub use figure::{FigureLedger, FigureSize, FigureView};
pub use kinds::categorical::{BarChart, MultiBarChart, PieChart};
pub use kinds::distribution::{BoxChart, DensityChart, HistogramChart};
pub use kinds::evaluation::{PredictionErrorsChart, RocCurveChart, TrainingHistoryChart};
pub use kinds::matrix::{ConfusionMatrixChart, HeatmapChart};
pub use kinds::series::{
    AcfPacfChart, LayerStyle, Marker, MultiLineChart, OutlierGridChart, OutlierPanel, OverlayLayer,
    ScatterOverlayChart, SeasonalChart, TimeSeriesChart,
};
pub use palette::{ColorScheme, Colormap};
pub use renderer::{FigureRenderer, RenderSettings};
pub use stats::ClassLabel;
pub use types::{Chart, ChartRequest, RenderOutcome};
