//! Configuration loading utilities

use std::env;
use std::path::{Path, PathBuf};

use folio_common::{FolioError, Result as FolioResult};
use thiserror::Error;
use tracing::{debug, info};

use crate::Config;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "FOLIO_CONFIG_PATH";

/// Files probed in the working directory when no path is given
const DEFAULT_CONFIG_FILES: [&str; 3] = ["folio.yaml", "folio.yml", "folio.toml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        /// Offending variable
        var: String,
        /// Parse failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for FolioError {
    fn from(err: ConfigError) -> Self {
        FolioError::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML or TOML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let mut config = Self::parse(path, &content)?;
        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables and files
    pub fn load() -> FolioResult<Config> {
        let config = if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::load_config(&config_path)?
        } else if let Some(path) = Self::find_default_file() {
            Self::load_config(path)?
        } else {
            debug!("No configuration file found, using defaults");
            let mut config = Config::default();
            Self::apply_env_overrides(&mut config)?;
            config.validate_all().map_err(ConfigError::ValidationError)?;
            config
        };

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> FolioResult<Config> {
        Ok(Self::load_config(path)?)
    }

    fn find_default_file() -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// Parse file contents, choosing the format from the file extension.
    fn parse(path: &Path, content: &str) -> Result<Config, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(content)?),
            _ => Ok(serde_yaml::from_str(content)?),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |key| env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, keyed by environment variable name
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("FOLIO_ROOT_DIR") {
            config.paths.root_dir = PathBuf::from(root);
        }

        if let Some(outputs) = lookup("FOLIO_OUTPUTS_DIR") {
            config.paths.outputs_dir = PathBuf::from(outputs);
        }

        if let Some(figures) = lookup("FOLIO_FIGURES_DIR") {
            config.paths.figures_dir = PathBuf::from(figures);
        }

        if let Some(dpi) = lookup("FOLIO_DPI") {
            config.plotting.dpi = dpi.trim().parse().map_err(|e| ConfigError::EnvParseError {
                var: "FOLIO_DPI".to_string(),
                source: Box::new(e),
            })?;
        }

        if let Some(palette) = lookup("FOLIO_PALETTE") {
            config.plotting.palette = palette;
        }

        if let Some(tickers) = lookup("FOLIO_TICKERS") {
            config.market.tickers = tickers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(level) = lookup("FOLIO_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in<'a>(vars: &'a HashMap<&str, &str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| vars.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            ("FOLIO_FIGURES_DIR", "/tmp/figures"),
            ("FOLIO_DPI", "150"),
            ("FOLIO_TICKERS", "TSLA, SPY,,"),
        ]);
        let mut config = Config::default();
        ConfigLoader::apply_overrides_from(&mut config, lookup_in(&vars)).unwrap();

        assert_eq!(config.paths.figures_dir(), PathBuf::from("/tmp/figures"));
        assert_eq!(config.plotting.dpi, 150);
        assert_eq!(config.market.tickers, vec!["TSLA", "SPY"]);
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let vars = HashMap::from([("FOLIO_DPI", "high")]);
        let mut config = Config::default();
        let err = ConfigLoader::apply_overrides_from(&mut config, lookup_in(&vars)).unwrap_err();

        assert!(matches!(err, ConfigError::EnvParseError { ref var, .. } if var == "FOLIO_DPI"));
    }

    #[test]
    fn test_parse_picks_format_from_extension() {
        let yaml = "plotting:\n  dpi: 120\n";
        let config = ConfigLoader::parse(Path::new("folio.yaml"), yaml).unwrap();
        assert_eq!(config.plotting.dpi, 120);
        assert_eq!(config.plotting.figure_width, 10.0);

        let toml = "[plotting]\ndpi = 96\n";
        let config = ConfigLoader::parse(Path::new("folio.toml"), toml).unwrap();
        assert_eq!(config.plotting.dpi, 96);
    }
}
