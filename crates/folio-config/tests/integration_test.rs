//! Integration tests for folio-config.
//!
//! These tests load configuration files from disk in both supported formats.

use std::path::PathBuf;

use folio_common::test_utils::{create_temp_dir, init_test_logging};
use folio_config::{Config, ConfigError, ConfigLoader};

#[test]
fn test_load_yaml_file() {
    init_test_logging();
    let dir = create_temp_dir();
    let path = dir.path().join("folio.yaml");
    std::fs::write(
        &path,
        r##"
project_name: Credit Risk Analytics
paths:
  root_dir: /srv/folio
  figures_dir: reports/figs
plotting:
  dpi: 200
  palette: vibrant
  background_color: "#FAFAFA"
"##,
    )
    .unwrap();

    let config = ConfigLoader::load_config(&path).unwrap();
    assert_eq!(config.project_name, "Credit Risk Analytics");
    assert_eq!(config.paths.figures_dir(), PathBuf::from("/srv/folio/reports/figs"));
    assert_eq!(config.plotting.dpi, 200);
    assert_eq!(config.plotting.palette, "vibrant");
    // Unspecified sections keep their defaults.
    assert_eq!(config.market.tickers, vec!["TSLA", "BND", "SPY"]);
}

#[test]
fn test_load_toml_file() {
    init_test_logging();
    let dir = create_temp_dir();
    let path = dir.path().join("folio.toml");
    std::fs::write(
        &path,
        r#"
[plotting]
figure_width = 12.0
figure_height = 8.0

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.plotting.figure_width, 12.0);
    assert_eq!(config.plotting.figure_height, 8.0);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = create_temp_dir();
    let path = dir.path().join("folio.yaml");
    std::fs::write(&path, "plotting:\n  dpi: 5000\n").unwrap();

    let err = ConfigLoader::load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = create_temp_dir();
    let err = ConfigLoader::load_config(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
}

#[test]
fn test_process_settings_are_usable() {
    let settings: &Config = folio_config::settings();
    assert!(settings.validate_all().is_ok());
    assert!(std::ptr::eq(settings, folio_config::settings()));
}
