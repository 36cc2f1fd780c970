//! End-to-end rendering tests: every chart kind, the skip branches, file
//! naming and the figure lifecycle.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use folio_common::test_utils::{count_files, create_temp_dir, init_test_logging, wobble};
use folio_figures::{
    AcfPacfChart, BarChart, BoxChart, Chart, ChartRequest, ClassLabel, ColorScheme,
    ConfusionMatrixChart,
    Decomposition, DensityChart, FigureDisplay, FigureRenderer, FigureSize, FigureView,
    HeatmapChart, HistogramChart, LayerStyle, Marker, Matrix, MultiBarChart, MultiLineChart,
    NamedSeries, OutlierGridChart, OutlierPanel, OverlayLayer, PieChart, PredictionErrorsChart,
    RenderOutcome, RenderSettings, RocCurveChart, ScatterOverlayChart, SeasonalChart, Series,
    Table, TimeSeriesChart, TrainingHistory, TrainingHistoryChart,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Shown {
    title: Option<String>,
    panel_titles: Vec<String>,
    size: (u32, u32),
    pixels: Vec<u8>,
    saved: Option<PathBuf>,
}

impl Shown {
    fn has_color(&self, rgb: (u8, u8, u8)) -> bool {
        self.pixels
            .chunks_exact(3)
            .any(|p| (p[0], p[1], p[2]) == rgb)
    }
}

/// Keeps a copy of every displayed figure
#[derive(Clone, Default)]
struct RecordingDisplay {
    shown: Arc<Mutex<Vec<Shown>>>,
}

impl RecordingDisplay {
    fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }
}

impl FigureDisplay for RecordingDisplay {
    fn show(&self, view: &FigureView<'_>) {
        self.shown.lock().unwrap().push(Shown {
            title: view.title.map(str::to_string),
            panel_titles: view.panel_titles.to_vec(),
            size: (view.width, view.height),
            pixels: view.pixels.to_vec(),
            saved: view.saved.map(Path::to_path_buf),
        });
    }
}

fn settings(dpi: u32) -> RenderSettings {
    RenderSettings {
        dpi,
        ..RenderSettings::default()
    }
}

fn renderer(dir: &Path) -> (FigureRenderer, RecordingDisplay) {
    let display = RecordingDisplay::default();
    let renderer = FigureRenderer::with_settings(
        Some(dir.to_path_buf()),
        settings(40),
        Box::new(display.clone()),
    )
    .unwrap();
    (renderer, display)
}

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

fn dated(n: usize, f: impl Fn(usize) -> f64) -> Series {
    Series::dated((0..n).map(day).collect(), (0..n).map(f).collect())
}

fn transactions() -> Table {
    let n = 60;
    Table::new()
        .with_column("amount", (0..n).map(|i| 50.0 + 40.0 * wobble(i) + (i % 7) as f64))
        .with_column("is_fraud", (0..n).map(|i| if i % 5 == 0 { "1" } else { "0" }))
        .with_column("merchant", (0..n).map(|i| ["grocery", "travel", "online"][i % 3]))
        .with_column("date", (0..n).map(|i| day(i).format("%Y-%m-%d").to_string()))
}

fn every_kind() -> Vec<ChartRequest> {
    let table = transactions();
    let returns = dated(80, |i| 0.02 * wobble(i));
    let corr = Matrix {
        rows: vec!["TSLA".into(), "BND".into(), "SPY".into()],
        columns: vec!["TSLA".into(), "BND".into(), "SPY".into()],
        values: vec![
            vec![1.0, -0.2, 0.6],
            vec![-0.2, 1.0, 0.1],
            vec![0.6, 0.1, 1.0],
        ],
    };

    let charts: Vec<Chart> = vec![
        HistogramChart::new(table.clone(), "amount").into(),
        BarChart {
            table: table.clone(),
            x: "merchant".into(),
            y: "amount".into(),
        }
        .into(),
        PieChart::new(vec![60.0, 25.0, 15.0], ["TSLA", "BND", "SPY"]).into(),
        TimeSeriesChart {
            table: table.clone(),
            date_col: "date".into(),
            value_col: "amount".into(),
        }
        .into(),
        BoxChart {
            table: table.clone(),
            y: "amount".into(),
            x: Some("merchant".into()),
        }
        .into(),
        HeatmapChart::new(corr).into(),
        DensityChart::new(table.clone(), "amount", "is_fraud").into(),
        RocCurveChart {
            labels: vec![0, 1, 1, 0, 1, 0],
            scores: vec![0.1, 0.9, 0.6, 0.4, 0.3, 0.2],
        }
        .into(),
        ConfusionMatrixChart {
            truth: vec![ClassLabel::Int(0), ClassLabel::Int(1), ClassLabel::Int(1)],
            predicted: vec![ClassLabel::Int(0), ClassLabel::Int(0), ClassLabel::Int(1)],
        }
        .into(),
        ScatterOverlayChart {
            layers: vec![
                OverlayLayer {
                    label: "Close".into(),
                    series: dated(40, |i| 100.0 + i as f64),
                    style: LayerStyle::default(),
                },
                OverlayLayer {
                    label: "Buy".into(),
                    series: dated(40, |i| if i % 10 == 0 { 100.0 + i as f64 } else { f64::NAN }),
                    style: LayerStyle {
                        color: Some("green".into()),
                        marker: Some(Marker::Square),
                        ..LayerStyle::default()
                    },
                },
            ],
        }
        .into(),
        OutlierGridChart {
            panels: vec![OutlierPanel {
                label: "TSLA".into(),
                returns: returns.clone(),
                outliers: dated(80, |i| if i == 7 { 0.02 * wobble(7) } else { f64::NAN }),
                extremes: Series::default(),
            }],
        }
        .into(),
        AcfPacfChart::new(returns.clone()).into(),
        TrainingHistoryChart {
            history: TrainingHistory::from_metrics([
                ("loss", vec![0.9, 0.5, 0.3, 0.25]),
                ("val_loss", vec![1.0, 0.6, 0.45, 0.4]),
            ]),
        }
        .into(),
        PredictionErrorsChart {
            models: vec![
                NamedSeries::new("ARIMA", returns.clone()),
                NamedSeries::new("LSTM", dated(80, |i| 0.01 * wobble(i + 3))),
            ],
        }
        .into(),
        MultiLineChart {
            lines: vec![
                NamedSeries::new("TSLA", dated(30, |i| 200.0 + i as f64)),
                NamedSeries::new("SPY", dated(30, |i| 400.0 - i as f64)),
            ],
        }
        .into(),
        SeasonalChart {
            decomposition: Decomposition {
                observed: dated(48, |i| 10.0 + (i % 12) as f64),
                trend: dated(48, |i| if (6..42).contains(&i) { 10.0 + 0.1 * i as f64 } else { f64::NAN }),
                seasonal: dated(48, |i| (i % 12) as f64 - 5.5),
                residual: dated(48, wobble),
            },
            title_prefix: "TSLA".into(),
        }
        .into(),
        MultiBarChart {
            metrics: vec![
                NamedSeries::new("Sharpe", Series::labelled(["TSLA", "BND", "SPY"], vec![0.8, 0.3, 0.9])),
                NamedSeries::new("Volatility", Series::labelled(["TSLA", "BND", "SPY"], vec![0.6, 0.05, 0.18])),
                NamedSeries::new("Max Drawdown", Series::labelled(["TSLA", "BND", "SPY"], vec![-0.7, -0.1, -0.3])),
            ],
        }
        .into(),
    ];

    charts
        .into_iter()
        .enumerate()
        .map(|(i, chart)| {
            let kind = chart.kind_name();
            ChartRequest::new(chart).titled(format!("Case {i} {kind}"))
        })
        .collect()
}

#[test]
fn test_every_kind_renders_and_saves() {
    init_test_logging();
    let dir = create_temp_dir();
    let (renderer, display) = renderer(dir.path());

    let requests = every_kind();
    for request in &requests {
        let outcome = renderer.render(request).unwrap();
        let saved = outcome
            .saved_path()
            .unwrap_or_else(|| panic!("{} was not saved: {outcome:?}", request.chart.kind_name()));
        assert!(saved.is_file());
        assert_eq!(saved.parent(), Some(dir.path()));
    }

    assert_eq!(count_files(dir.path()), requests.len());
    assert_eq!(display.shown().len(), requests.len());
    assert_eq!(renderer.ledger().created(), requests.len());
    assert_eq!(renderer.ledger().released(), requests.len());
    assert_eq!(renderer.ledger().open(), 0);
}

#[test]
fn test_figure_sizes_follow_kind() {
    let dir = create_temp_dir();
    let (renderer, display) = renderer(dir.path());

    let pie = ChartRequest::new(PieChart::new(vec![1.0, 2.0], ["a", "b"]));
    renderer.render(&pie).unwrap();
    let roc = ChartRequest::new(RocCurveChart {
        labels: vec![0, 1],
        scores: vec![0.3, 0.8],
    });
    renderer.render(&roc).unwrap();

    let shown = display.shown();
    assert_eq!(shown[0].size, (400, 400));
    assert_eq!(shown[1].size, (400, 240));
}

#[test]
fn test_legend_pie_keeps_wedge_percentages() {
    if !folio_figures::theme::text_available() {
        return;
    }
    let dir = create_temp_dir();
    let display = RecordingDisplay::default();
    let renderer = FigureRenderer::with_settings(
        Some(dir.path().to_path_buf()),
        RenderSettings {
            palette: ColorScheme::Light,
            ..settings(100)
        },
        Box::new(display.clone()),
    )
    .unwrap();

    // One pale wedge: its percentage is written in black inside the disc.
    let mut pie = PieChart::new(vec![5.0], ["Equity"]);
    pie.legend = true;
    renderer.render(&ChartRequest::new(pie)).unwrap();

    let shown = &display.shown()[0];
    let (w, h) = shown.size;
    let dark_in_pie = (h * 3 / 10..h * 7 / 10).any(|y| {
        (0..w * 6 / 10).any(|x| {
            let i = ((y * w + x) * 3) as usize;
            shown.pixels[i..i + 3].iter().all(|c| *c < 80)
        })
    });
    assert!(dark_in_pie, "no percentage text inside the pie");
}

#[test]
fn test_invalid_input_is_skipped_without_files() {
    init_test_logging();
    let dir = create_temp_dir();
    let (renderer, display) = renderer(dir.path());

    let words = Table::new().with_column("growth", ["n/a", "", "tbd"]);
    let skips: Vec<ChartRequest> = vec![
        ChartRequest::new(HistogramChart::new(words.clone(), "growth")).titled("Growth"),
        ChartRequest::new(HistogramChart::new(words.clone(), "absent")).titled("Growth"),
        ChartRequest::new(DensityChart::new(transactions(), "amount", "label")).titled("Density"),
        ChartRequest::new(Chart::Heatmap(HeatmapChart::new(Matrix::default()))).titled("Heat"),
        ChartRequest::new(Chart::Heatmap(HeatmapChart {
            matrix: None,
            ..HeatmapChart::new(Matrix::default())
        })),
        ChartRequest::new(RocCurveChart {
            labels: vec![0, 1, 1],
            scores: vec![0.2, 0.4],
        }),
        ChartRequest::new(RocCurveChart {
            labels: vec![1, 1],
            scores: vec![0.2, 0.4],
        }),
        ChartRequest::new(ConfusionMatrixChart {
            truth: vec![],
            predicted: vec![],
        }),
        ChartRequest::new(OutlierGridChart { panels: vec![] }).titled("Outliers"),
        ChartRequest::new(AcfPacfChart::new(Series::new(vec![1.0, f64::NAN]))),
        ChartRequest::new(TrainingHistoryChart {
            history: TrainingHistory::default(),
        }),
        ChartRequest::new(PredictionErrorsChart { models: vec![] }),
        ChartRequest::new(MultiLineChart { lines: vec![] }),
        ChartRequest::new(MultiBarChart { metrics: vec![] }).titled("Metrics"),
    ];

    for request in &skips {
        let outcome = renderer.render(request).unwrap();
        assert!(outcome.is_skipped(), "{} rendered: {outcome:?}", request.chart.kind_name());
    }

    assert_eq!(count_files(dir.path()), 0);
    assert!(display.shown().is_empty());
    assert_eq!(renderer.ledger().created(), skips.len());
    assert_eq!(renderer.ledger().released(), skips.len());
}

#[test]
fn test_density_skip_names_missing_column() {
    let dir = create_temp_dir();
    let (renderer, _) = renderer(dir.path());
    let request = ChartRequest::new(DensityChart::new(transactions(), "amount", "label"));

    match renderer.render(&request).unwrap() {
        RenderOutcome::Skipped { reason } => assert!(reason.contains("label"), "{reason}"),
        other => panic!("expected a skip, got {other:?}"),
    }
}

#[test]
fn test_title_is_slugified_for_file_but_not_display() {
    let dir = create_temp_dir();
    let (renderer, display) = renderer(dir.path());

    let request = ChartRequest::new(HistogramChart::new(transactions(), "amount")).titled("My Chart!!");
    let outcome = renderer.render(&request).unwrap();

    let expected = dir.path().join("my_chart.png");
    assert_eq!(outcome.saved_path(), Some(expected.as_path()));
    assert!(expected.is_file());

    let shown = display.shown();
    assert_eq!(shown[0].title.as_deref(), Some("My Chart!!"));
    assert_eq!(shown[0].saved.as_deref(), Some(expected.as_path()));
}

#[test]
fn test_default_titles_name_files() {
    let dir = create_temp_dir();
    let (renderer, _) = renderer(dir.path());

    let hist = renderer
        .render(&ChartRequest::new(HistogramChart::new(transactions(), "amount")))
        .unwrap();
    assert_eq!(hist.saved_path(), Some(dir.path().join("distribution_of_amount.png").as_path()));

    let acf = renderer
        .render(&ChartRequest::new(AcfPacfChart::new(dated(40, wobble))))
        .unwrap();
    assert_eq!(acf.saved_path(), Some(dir.path().join("time_series_acf_pacf.png").as_path()));

    let seasonal = renderer
        .render(&ChartRequest::new(SeasonalChart {
            decomposition: Decomposition {
                observed: dated(24, |i| i as f64),
                ..Decomposition::default()
            },
            title_prefix: "BND".into(),
        }))
        .unwrap();
    assert_eq!(
        seasonal.saved_path(),
        Some(dir.path().join("bnd_seasonal_decomposition.png").as_path())
    );
}

#[test]
fn test_untitled_grids_display_without_saving() {
    let dir = create_temp_dir();
    let (renderer, display) = renderer(dir.path());

    let grid = ChartRequest::new(OutlierGridChart {
        panels: ["TSLA", "BND", "SPY"]
            .iter()
            .map(|t| OutlierPanel {
                label: (*t).to_string(),
                returns: dated(30, wobble),
                outliers: Series::default(),
                extremes: Series::default(),
            })
            .collect(),
    });
    assert_eq!(renderer.render(&grid).unwrap(), RenderOutcome::Rendered { saved: None });

    let bars = ChartRequest::new(MultiBarChart {
        metrics: vec![NamedSeries::new("Sharpe", Series::new(vec![0.5, 0.7]))],
    });
    assert_eq!(renderer.render(&bars).unwrap(), RenderOutcome::Rendered { saved: None });

    let mut acf = AcfPacfChart::new(dated(40, wobble));
    acf.title_prefix = String::new();
    assert_eq!(
        renderer.render(&ChartRequest::new(acf)).unwrap(),
        RenderOutcome::Rendered { saved: None }
    );

    assert_eq!(count_files(dir.path()), 0);
    let shown = display.shown();
    assert_eq!(shown.len(), 3);
    assert_eq!(shown[0].panel_titles.len(), 3);
    assert_eq!(shown[0].panel_titles[2], "SPY Daily Returns with Outliers");
    assert_eq!(shown[1].panel_titles, vec!["Sharpe".to_string()]);
    assert!(shown.iter().all(|s| s.title.is_none()));
}

#[test]
fn test_roc_draws_curve_and_diagonal() {
    let dir = create_temp_dir();
    let (renderer, display) = renderer(dir.path());

    let request = ChartRequest::new(RocCurveChart {
        labels: vec![0, 1, 1, 0],
        scores: vec![0.1, 0.9, 0.8, 0.2],
    });
    renderer.render(&request).unwrap();

    let shown = &display.shown()[0];
    assert!(shown.has_color((255, 140, 0)), "ROC curve missing");
    assert!(shown.has_color((0, 0, 128)), "no-skill diagonal missing");
}

#[test]
fn test_seasonal_has_four_panels() {
    let dir = create_temp_dir();
    let (renderer, display) = renderer(dir.path());
    let request = every_kind()
        .into_iter()
        .find(|r| r.chart.kind_name() == "seasonal_decomposition")
        .unwrap();
    renderer.render(&request).unwrap();

    let shown = &display.shown()[0];
    assert_eq!(
        shown.panel_titles,
        vec!["TSLA Observed", "Trend", "Seasonal", "Residual"]
    );
}

#[test]
fn test_saved_png_records_dpi() {
    let dir = create_temp_dir();
    let renderer = FigureRenderer::with_settings(
        Some(dir.path().to_path_buf()),
        RenderSettings {
            figure_size: FigureSize::new(2.0, 1.0),
            ..settings(300)
        },
        Box::new(RecordingDisplay::default()),
    )
    .unwrap();

    let request = ChartRequest::new(HistogramChart::new(transactions(), "amount")).titled("Amounts");
    let outcome = renderer.render(&request).unwrap();
    let path = outcome.saved_path().unwrap();

    let decoder = png::Decoder::new(std::fs::File::open(path).unwrap());
    let reader = decoder.read_info().unwrap();
    let info = reader.info();
    assert_eq!((info.width, info.height), (600, 300));
    let dims = info.pixel_dims.unwrap();
    assert_eq!(dims.xppu, 11811);
    assert_eq!(dims.yppu, 11811);
    assert_eq!(dims.unit, png::Unit::Meter);
}

#[test]
fn test_request_file_round_trip() {
    let dir = create_temp_dir();
    let (renderer, _) = renderer(dir.path());
    let json = r#"{
        "title": "Revenue Growth (%)",
        "chart": {
            "kind": "bar",
            "table": {"columns": [
                {"name": "segment", "cells": ["retail", "retail", "corporate"]},
                {"name": "growth", "cells": [1.5, 2.5, "3.0"]}
            ]},
            "x": "segment",
            "y": "growth"
        }
    }"#;
    let request: ChartRequest = serde_json::from_str(json).unwrap();
    let outcome = renderer.render(&request).unwrap();
    assert_eq!(
        outcome.saved_path(),
        Some(dir.path().join("revenue_growth.png").as_path())
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_histogram_never_leaks_figures(values in prop::collection::vec(-1e6f64..1e6, 0..40), bins in 1usize..30) {
        let dir = create_temp_dir();
        let (renderer, _) = renderer(dir.path());
        let table = Table::new().with_column("x", values.clone());
        let mut chart = HistogramChart::new(table, "x");
        chart.bins = bins;

        let outcome = renderer.render(&ChartRequest::new(chart)).unwrap();
        prop_assert_eq!(outcome.is_skipped(), values.is_empty());
        prop_assert_eq!(renderer.ledger().open(), 0);
    }
}
