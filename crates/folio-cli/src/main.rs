//! folio-plot - render charts from the command line

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use folio_common::{init_logging, FolioError, LoggingConfig};
use folio_config::{Config, ConfigLoader};
use folio_figures::{
    ChartRequest, FigureRenderer, HistogramChart, LogDisplay, RenderOutcome, RenderSettings, Table,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overriding the configured one
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a chart request read from a JSON or YAML file
    Render {
        /// Request file (.json, .yaml or .yml)
        request: PathBuf,

        /// Output directory, defaults to the configured figures directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Histogram of one column of a CSV file
    Histogram {
        /// CSV file with a header row
        csv: PathBuf,

        /// Column to plot
        #[arg(long)]
        column: String,

        /// Number of bins
        #[arg(short, long, default_value_t = 20)]
        bins: usize,

        /// Figure title; also names the output file
        #[arg(short, long)]
        title: Option<String>,

        /// Symmetric-log x axis
        #[arg(long)]
        log_scale: bool,

        /// Output directory, defaults to the configured figures directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, fallback) = load_config(args.config.as_deref())?;
    init_logging(LoggingConfig {
        level: args
            .log_level
            .clone()
            .unwrap_or_else(|| config.logging.level.clone()),
        json_format: config.logging.json_format,
        file_path: config.logging.file_path.clone(),
        ..LoggingConfig::default()
    })?;
    info!("Starting folio-plot v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = fallback {
        warn!("Using default configuration: {}", e);
    }

    match run(args.command, &config)? {
        RenderOutcome::Rendered { saved: Some(path) } => println!("{}", path.display()),
        RenderOutcome::Rendered { saved: None } => println!("Figure displayed without saving"),
        RenderOutcome::Skipped { reason } => println!("Skipped: {reason}"),
    }
    Ok(())
}

/// Configuration to run with, plus the load error when defaults stand in.
///
/// An explicit `--config` file must load. Without one, a broken
/// discovered file falls back to defaults.
fn load_config(path: Option<&Path>) -> Result<(Config, Option<FolioError>)> {
    match path {
        Some(path) => {
            let config = ConfigLoader::load_from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            Ok((config, None))
        }
        None => Ok(or_default(ConfigLoader::load())),
    }
}

fn or_default(loaded: folio_common::Result<Config>) -> (Config, Option<FolioError>) {
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

/// Parse a chart request, choosing the format from the file extension
fn read_request(path: &Path) -> Result<ChartRequest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request {}", path.display()))?;
    let request = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid YAML request {}", path.display()))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON request {}", path.display()))?,
    };
    Ok(request)
}

fn build_request(command: Command) -> Result<(ChartRequest, Option<PathBuf>)> {
    match command {
        Command::Render { request, out } => Ok((read_request(&request)?, out)),
        Command::Histogram {
            csv,
            column,
            bins,
            title,
            log_scale,
            out,
        } => {
            let table = Table::from_csv_path(&csv)
                .with_context(|| format!("Failed to read {}", csv.display()))?;
            debug!("Read {} rows from {}", table.row_count(), csv.display());

            let mut chart = HistogramChart::new(table, column);
            chart.bins = bins;
            chart.log_scale = log_scale;
            let mut request = ChartRequest::new(chart);
            request.title = title;
            Ok((request, out))
        }
    }
}

fn run(command: Command, config: &Config) -> Result<RenderOutcome> {
    let (request, out) = build_request(command)?;
    let dir = out.unwrap_or_else(|| config.paths.figures_dir());
    let renderer = FigureRenderer::with_settings(
        Some(dir),
        RenderSettings::from_config(config),
        Box::new(LogDisplay),
    )?;
    Ok(renderer.render(&request)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_common::test_utils::create_temp_dir;
    use folio_figures::Chart;

    #[test]
    fn test_parse_histogram_args() {
        let args = Args::try_parse_from([
            "folio-plot",
            "--log-level",
            "debug",
            "histogram",
            "prices.csv",
            "--column",
            "Close",
            "--title",
            "TSLA Close",
        ])
        .unwrap();
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        match args.command {
            Command::Histogram {
                column, bins, title, ..
            } => {
                assert_eq!(column, "Close");
                assert_eq!(bins, 20);
                assert_eq!(title.as_deref(), Some("TSLA Close"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_read_yaml_request() {
        let dir = create_temp_dir();
        let path = dir.path().join("roc.yaml");
        fs::write(
            &path,
            "title: Fraud ROC\nchart:\n  kind: roc_curve\n  labels: [0, 1]\n  scores: [0.2, 0.9]\n",
        )
        .unwrap();

        let request = read_request(&path).unwrap();
        assert_eq!(request.title.as_deref(), Some("Fraud ROC"));
        assert!(matches!(request.chart, Chart::RocCurve(_)));
    }

    #[test]
    fn test_histogram_command_renders_csv() {
        let dir = create_temp_dir();
        let csv = dir.path().join("prices.csv");
        fs::write(&csv, "Date,Close\n2024-01-01,10\n2024-01-02,12\n2024-01-03,11\n").unwrap();
        let out = dir.path().join("figs");

        let mut config = Config::default();
        config.plotting.dpi = 50;
        let outcome = run(
            Command::Histogram {
                csv,
                column: "Close".into(),
                bins: 5,
                title: Some("TSLA Close".into()),
                log_scale: false,
                out: Some(out.clone()),
            },
            &config,
        )
        .unwrap();

        assert_eq!(outcome.saved_path(), Some(out.join("tsla_close.png").as_path()));
    }

    #[test]
    fn test_broken_discovered_config_falls_back_to_defaults() {
        let (config, fallback) = or_default(Err(FolioError::new("bad folio.yaml")));
        assert_eq!(config.plotting.dpi, Config::default().plotting.dpi);
        assert_eq!(fallback.unwrap().to_string(), "bad folio.yaml");

        let mut custom = Config::default();
        custom.plotting.dpi = 72;
        let (config, fallback) = or_default(Ok(custom));
        assert_eq!(config.plotting.dpi, 72);
        assert!(fallback.is_none());
    }

    #[test]
    fn test_explicit_config_must_load() {
        let dir = create_temp_dir();
        let path = dir.path().join("folio.yaml");
        fs::write(&path, "plotting:\n  dpi: 0\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_request_file_is_an_error() {
        let dir = create_temp_dir();
        assert!(read_request(&dir.path().join("absent.json")).is_err());
    }
}
