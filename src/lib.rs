//! Rainfall Indicator Library
//!
//! Computes a daily rainfall accumulation indicator per administrative
//! region from hourly yearly-cumulative rainfall rasters (GeoTIFF tiles).
//!
//! This library provides tools for:
//! - Locating and decoding hourly tiles, with fallback between products
//! - Loading region boundaries in the projection of each product
//! - Averaging a raster over each region (zonal mean)
//! - Turning cumulative snapshots into daily accumulations, including the
//!   December 31 year-boundary reset
//! - Writing the daily series as CSV or Parquet

pub mod config;
pub mod constants;
pub mod error;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod accumulation;
        pub mod grid_access;
        pub mod inventory;
        pub mod region_catalog;
        pub mod series;
        pub mod zonal_reducer;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{
    DailyIndicator, DataSource, Diagnostic, DiagnosticKind, DiagnosticLog, HourStamp,
    RasterSnapshot, RegionPolygon,
};
pub use config::IndicatorConfig;
pub use error::{IndicatorError, IndicatorError as Error, Result};
