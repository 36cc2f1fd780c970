//! # Folio Config
//!
//! Typed settings for folio-plot: project paths, plotting defaults,
//! market data parameters and logging. Settings are loaded from YAML or
//! TOML with environment variable overrides and validated before use.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod loader;
pub mod settings;
pub mod validation;

use std::sync::OnceLock;

pub use loader::{ConfigError, ConfigLoader};
pub use settings::{Config, LoggingSettings, MarketConfig, PathsConfig, PlottingConfig};

static SETTINGS: OnceLock<Config> = OnceLock::new();

/// Returns the process-wide settings, loading them on first use.
///
/// A configuration that fails to load or validate is reported once and
/// replaced by the defaults, so callers always get usable settings.
pub fn settings() -> &'static Config {
    SETTINGS.get_or_init(|| match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Falling back to default settings: {}", e);
            Config::default()
        }
    })
}
