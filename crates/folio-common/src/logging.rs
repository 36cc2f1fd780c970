//! Structured logging infrastructure for folio-plot

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{FolioError, Result};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "folio_figures=trace")
    pub level: String,
    /// Whether to emit JSON lines
    pub json_format: bool,
    /// Whether to enable pretty formatting with colors
    pub pretty_format: bool,
    /// Optional file path for log output
    pub file_path: Option<String>,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_format: false,
            file_path: None,
            include_targets: true,
        }
    }
}

fn open_log_file(path: &str) -> Result<std::fs::File> {
    Ok(std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?)
}

fn already_initialized(err: impl std::error::Error + Send + Sync + 'static) -> FolioError {
    FolioError::with_source("Global tracing subscriber already set", err)
}

/// Initialize the tracing subscriber with the given configuration
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| FolioError::config_with_source("Invalid log filter", e))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_format {
        let layer = fmt::layer().json().with_target(config.include_targets);

        if let Some(file_path) = config.file_path {
            let file = open_log_file(&file_path)?;
            registry
                .with(layer.with_writer(file))
                .try_init()
                .map_err(already_initialized)?;
        } else {
            registry.with(layer).try_init().map_err(already_initialized)?;
        }
    } else if config.pretty_format {
        let layer = fmt::layer().pretty().with_target(config.include_targets);

        if let Some(file_path) = config.file_path {
            let file = open_log_file(&file_path)?;
            registry
                .with(layer.with_ansi(false).with_writer(file))
                .try_init()
                .map_err(already_initialized)?;
        } else {
            registry.with(layer).try_init().map_err(already_initialized)?;
        }
    } else {
        let layer = fmt::layer().compact().with_target(config.include_targets);

        if let Some(file_path) = config.file_path {
            let file = open_log_file(&file_path)?;
            registry
                .with(layer.with_ansi(false).with_writer(file))
                .try_init()
                .map_err(already_initialized)?;
        } else {
            registry.with(layer).try_init().map_err(already_initialized)?;
        }
    }

    Ok(())
}

/// Initialize logging with default configuration
pub fn init_default_logging() -> Result<()> {
    init_logging(LoggingConfig::default())
}
