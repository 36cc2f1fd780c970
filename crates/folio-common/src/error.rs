//! Error types and utilities for folio-plot

use thiserror::Error;

/// Result type alias for folio-plot operations
pub type Result<T> = std::result::Result<T, FolioError>;

/// Main error type for folio-plot operations
///
/// Only fatal conditions are represented here. Empty or unusable chart
/// input is not an error: renderers report it as a skipped outcome.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Drawing and image encoding errors
    #[error("Render error: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed input data that cannot be read at all
    #[error("Data error: {message}")]
    Data {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for settings or user input
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl FolioError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new serialization error with source
    pub fn serialization_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new render error with source
    pub fn render_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Render {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new data error with source
    pub fn data_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Data {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }
}

// Error conversion implementations for external types

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_with_source("JSON error", err)
    }
}

impl From<serde_yaml::Error> for FolioError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization_with_source("YAML error", err)
    }
}

impl From<toml::de::Error> for FolioError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML parsing error", err)
    }
}

impl From<csv::Error> for FolioError {
    fn from(err: csv::Error) -> Self {
        Self::data_with_source("CSV error", err)
    }
}

impl From<png::EncodingError> for FolioError {
    fn from(err: png::EncodingError) -> Self {
        Self::render_with_source("PNG encoding failed", err)
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to FolioError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for FolioError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::render_with_source("Figure drawing failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let error = FolioError::new("test message");
        assert!(error.to_string().contains("test message"));

        let config_error = FolioError::config_with_source(
            "config issue",
            io::Error::new(io::ErrorKind::NotFound, "folio.yaml"),
        );
        assert!(config_error.to_string().contains("Configuration error"));
        assert!(config_error.to_string().contains("config issue"));

        let render_error = FolioError::render("backend gone");
        assert_eq!(render_error.to_string(), "Render error: backend gone");

        let validation_error = FolioError::validation_field("must be positive", "dpi");
        assert!(validation_error.to_string().contains("Validation error"));
        assert!(matches!(
            validation_error,
            FolioError::Validation { field: Some(ref f), .. } if f == "dpi"
        ));
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let wrapped_error = FolioError::with_source("Failed to read file", io_error);

        assert!(wrapped_error.to_string().contains("Failed to read file"));
        assert!(wrapped_error.source().is_some());

        let data_error = FolioError::data_with_source(
            "Bad request",
            io::Error::new(io::ErrorKind::InvalidData, "truncated"),
        );
        assert!(data_error.to_string().contains("Data error"));
        assert!(data_error.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let folio_error: FolioError = io_error.into();

        assert!(folio_error.to_string().contains("I/O error"));
        assert!(matches!(folio_error, FolioError::Io(_)));
    }

    #[test]
    fn test_serde_error_conversion() {
        let invalid_json = r#"{"kind": histogram}"#;
        let serde_error = serde_json::from_str::<serde_json::Value>(invalid_json).unwrap_err();
        let folio_error: FolioError = serde_error.into();

        assert!(folio_error.to_string().contains("Serialization error"));
        assert!(folio_error.source().is_some());
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("dpi = = 300").unwrap_err();
        let folio_error: FolioError = toml_error.into();

        assert!(matches!(folio_error, FolioError::Config { .. }));
    }
}
