//! Application configuration structures

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::validation;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Human readable project name
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub project_name: String,

    /// Filesystem layout
    #[validate]
    pub paths: PathsConfig,

    /// Figure rendering defaults
    #[validate]
    pub plotting: PlottingConfig,

    /// Market data parameters
    #[validate]
    pub market: MarketConfig,

    /// Logging configuration
    #[validate]
    pub logging: LoggingSettings,
}

/// Filesystem layout. Relative paths are resolved against `root_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PathsConfig {
    /// Project root
    pub root_dir: PathBuf,
    /// Input data
    pub data_dir: PathBuf,
    /// Downloaded, untouched data
    pub raw_data_dir: PathBuf,
    /// Cleaned data
    pub processed_data_dir: PathBuf,
    /// Generated artifacts
    pub outputs_dir: PathBuf,
    /// Where rendered figures are written
    pub figures_dir: PathBuf,
    /// Generated reports
    pub reports_dir: PathBuf,
    /// Serialized models
    pub models_dir: PathBuf,
}

/// Figure rendering defaults
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlottingConfig {
    /// Raster resolution of saved figures
    #[validate(range(min = 50, max = 1200, message = "DPI must be between 50 and 1200"))]
    pub dpi: u32,

    /// Default figure width in inches
    #[validate(range(min = 1.0, max = 40.0, message = "Figure width must be between 1 and 40 inches"))]
    pub figure_width: f64,

    /// Default figure height in inches
    #[validate(range(min = 1.0, max = 40.0, message = "Figure height must be between 1 and 40 inches"))]
    pub figure_height: f64,

    /// Named palette: default, dark, light, vibrant, monochrome or custom
    #[validate(length(min = 1, message = "Palette cannot be empty"))]
    pub palette: String,

    /// Colors used when `palette` is `custom` (hex format)
    pub custom_colors: Vec<String>,

    /// Figure background color (hex format)
    pub background_color: String,
}

/// Market data parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MarketConfig {
    /// Asset tickers under analysis
    #[validate(length(min = 1, message = "At least one ticker is required"))]
    pub tickers: Vec<String>,

    /// First trading day of the analysis window (YYYY-MM-DD)
    pub start_date: String,

    /// Last trading day of the analysis window (YYYY-MM-DD)
    pub end_date: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level or env-filter directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    pub json_format: bool,

    /// Optional log file path
    pub file_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_name: "Financial Portfolio Forecasting".to_string(),
            paths: PathsConfig::default(),
            plotting: PlottingConfig::default(),
            market: MarketConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            data_dir: PathBuf::from("data"),
            raw_data_dir: PathBuf::from("data/raw"),
            processed_data_dir: PathBuf::from("data/processed"),
            outputs_dir: PathBuf::from("outputs"),
            figures_dir: PathBuf::from("outputs/figures"),
            reports_dir: PathBuf::from("outputs/reports"),
            models_dir: PathBuf::from("outputs/models"),
        }
    }
}

impl Default for PlottingConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            figure_width: 10.0,
            figure_height: 6.0,
            palette: "default".to_string(),
            custom_colors: Vec::new(),
            background_color: "#FFFFFF".to_string(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            tickers: vec!["TSLA".to_string(), "BND".to_string(), "SPY".to_string()],
            start_date: "2015-01-01".to_string(),
            end_date: "2026-01-15".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

impl PathsConfig {
    /// Resolves a configured path against `root_dir` unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }

    /// Directory rendered figures are written to.
    pub fn figures_dir(&self) -> PathBuf {
        self.resolve(&self.figures_dir)
    }

    /// Directory generated reports are written to.
    pub fn reports_dir(&self) -> PathBuf {
        self.resolve(&self.reports_dir)
    }

    /// Directory raw market data is read from.
    pub fn raw_data_dir(&self) -> PathBuf {
        self.resolve(&self.raw_data_dir)
    }
}

impl PlottingConfig {
    fn validate_colors(&self, errors: &mut ValidationErrors) {
        if validation::validate_hex_color(&self.background_color).is_err() {
            errors.add(
                "background_color",
                ValidationError::new("invalid_hex_color"),
            );
        }

        if let Err(e) = validation::validate_palette_name(&self.palette) {
            errors.add("palette", e);
        }

        if self.palette.eq_ignore_ascii_case("custom") && self.custom_colors.is_empty() {
            errors.add("custom_colors", ValidationError::new("empty_custom_palette"));
        }

        if self
            .custom_colors
            .iter()
            .any(|c| validation::validate_hex_color(c).is_err())
        {
            errors.add("custom_colors", ValidationError::new("invalid_hex_color"));
        }
    }
}

impl MarketConfig {
    fn validate_window(&self, errors: &mut ValidationErrors) {
        if let Err(e) = validation::validate_date_range(&self.start_date, &self.end_date) {
            errors.add("start_date", e);
        }
    }
}

impl Config {
    /// Comprehensive validation of the entire configuration
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        // First run the derived validation
        self.validate()?;

        // Then the checks that span fields or need parsing
        let mut errors = ValidationErrors::new();
        self.plotting.validate_colors(&mut errors);
        self.market.validate_window(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate_all().is_ok());
        assert_eq!(config.plotting.dpi, 300);
        assert_eq!(config.paths.figures_dir(), PathBuf::from("./outputs/figures"));
    }

    #[test]
    fn test_out_of_range_dpi_is_rejected() {
        let mut config = Config::default();
        config.plotting.dpi = 10;
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_custom_palette_requires_colors() {
        let mut config = Config::default();
        config.plotting.palette = "custom".to_string();
        assert!(config.validate_all().is_err());

        config.plotting.custom_colors = vec!["#112233".to_string(), "#abcdef".to_string()];
        assert!(config.validate_all().is_ok());

        config.plotting.custom_colors.push("teal".to_string());
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_inverted_market_window_is_rejected() {
        let mut config = Config::default();
        config.market.start_date = "2026-02-01".to_string();
        config.market.end_date = "2015-01-01".to_string();
        let errors = config.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("start_date"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let mut paths = PathsConfig::default();
        paths.root_dir = PathBuf::from("/srv/folio");
        assert_eq!(paths.figures_dir(), PathBuf::from("/srv/folio/outputs/figures"));

        paths.figures_dir = PathBuf::from("/tmp/figs");
        assert_eq!(paths.figures_dir(), PathBuf::from("/tmp/figs"));
    }
}
