//! Error handling for rainfall indicator operations.
//!
//! Only conditions that stop a run live here. Per-hour and per-region
//! recoveries (missing tiles, skipped regions, source discontinuities) are
//! reported as [`crate::app::models::Diagnostic`] values instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Raster format error in file '{path}': {reason}")]
    RasterFormat { path: PathBuf, reason: String },

    #[error("TIFF decoding failed for file '{path}'")]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Region catalog error in '{path}': {reason}")]
    RegionCatalog { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Configuration loading failed")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Output error: {message}")]
    Output { message: String },

    #[error("CSV output failed")]
    Csv(#[from] csv::Error),

    #[error("Parquet output failed")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

impl IndicatorError {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a raster format error
    pub fn raster_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::RasterFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a decoder failure with the offending path
    pub fn tiff(path: impl Into<PathBuf>, source: tiff::TiffError) -> Self {
        Self::Tiff {
            path: path.into(),
            source,
        }
    }

    /// Create a region catalog error
    pub fn region_catalog(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::RegionCatalog {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for IndicatorError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

pub type Result<T> = std::result::Result<T, IndicatorError>;
