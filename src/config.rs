//! Configuration management and validation.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `RAINFALL_INDICATOR__*` environment variables, and finally the
//! command-line overrides applied by the CLI.

use crate::app::models::Crs;
use crate::constants::{
    APP_NAME, DEFAULT_DATA_ROOTS, DEFAULT_REGION_CODE_PROPERTY, DEFAULT_REGION_FILE_TEMPLATE,
    DEFAULT_REGIONS_DIR, ENV_PREFIX, NODATA_SENTINEL_THRESHOLD, TILES_SUBDIR,
};
use crate::error::{IndicatorError, Result};
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the hourly tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilesConfig {
    /// Explicit tiles directory, bypassing data root resolution
    pub tiles_dir: Option<PathBuf>,

    /// Data roots tried in order; the first existing one wins
    pub data_roots: Vec<PathBuf>,

    /// Tiles location below the data root
    pub tiles_subdir: String,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            tiles_dir: None,
            data_roots: DEFAULT_DATA_ROOTS.iter().map(PathBuf::from).collect(),
            tiles_subdir: TILES_SUBDIR.to_string(),
        }
    }
}

impl TilesConfig {
    /// Resolve the tiles directory
    ///
    /// Without an explicit directory, the first data root that exists is
    /// used; when none exists the last candidate is returned so that missing
    /// tiles are reported against a meaningful path.
    pub fn resolve_tiles_dir(&self) -> PathBuf {
        if let Some(dir) = &self.tiles_dir {
            return dir.clone();
        }

        let root = self
            .data_roots
            .iter()
            .find(|root| root.is_dir())
            .or_else(|| self.data_roots.last())
            .cloned()
            .unwrap_or_default();

        debug!("Resolved data root: {}", root.display());
        root.join(&self.tiles_subdir)
    }
}

/// Location and layout of the region catalog
///
/// Catalog files are GeoJSON FeatureCollections, one per reference system.
/// Boundaries distributed in another vector format, such as the GEOFLA
/// FlatGeobuf files, are converted once beforehand, for example:
///
/// ```text
/// ogr2ogr -f GeoJSON departements_4326.geojson geofla2016_departements_4326_simplified.fgb
/// ogr2ogr -f GeoJSON departements_3857.geojson geofla2016_departements_3857_simplified.fgb
/// ```
///
/// Keeping the source naming only takes a different `file_template`, e.g.
/// `geofla2016_departements_{epsg}_simplified.geojson`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionsConfig {
    /// Directory holding one catalog file per reference system
    pub regions_dir: PathBuf,

    /// File name template, `{epsg}` is replaced by the zero-padded EPSG code
    pub file_template: String,

    /// Feature property holding the region code
    pub code_property: String,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            regions_dir: PathBuf::from(DEFAULT_REGIONS_DIR),
            file_template: DEFAULT_REGION_FILE_TEMPLATE.to_string(),
            code_property: DEFAULT_REGION_CODE_PROPERTY.to_string(),
        }
    }
}

impl RegionsConfig {
    /// Catalog file for a reference system
    pub fn file_for(&self, crs: Crs) -> PathBuf {
        let name = self
            .file_template
            .replace("{epsg}", &format!("{:04}", crs.epsg()));
        self.regions_dir.join(name)
    }
}

/// Zonal reduction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Raw values strictly above this are excluded from the mean
    pub nodata_threshold: f64,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            nodata_threshold: NODATA_SENTINEL_THRESHOLD,
        }
    }
}

/// Output formats for the daily series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated rows, ready for bulk loading
    Csv,
    /// Single Parquet file
    Parquet,
}

/// Output destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Output file; standard output when absent (CSV only)
    pub path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Csv,
            path: None,
        }
    }
}

/// Global configuration for the rainfall indicator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub tiles: TilesConfig,
    pub regions: RegionsConfig,
    pub reducer: ReducerConfig,
    pub output: OutputConfig,
}

impl IndicatorConfig {
    /// Default config file: `<config_dir>/rainfall-indicator/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            IndicatorError::configuration("Could not determine user config directory")
        })?;
        Ok(config_dir.join(APP_NAME).join("config.toml"))
    }

    /// Load defaults, then the config file, then environment variables
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match config_file {
            Some(path) => {
                debug!("Loading config file: {}", path.display());
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Ok(default_path) = Self::default_config_path() {
                    debug!("Looking for default config file: {}", default_path.display());
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        Ok(config)
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.reducer.nodata_threshold.is_finite() {
            return Err(IndicatorError::configuration(format!(
                "No-data threshold must be finite, got {}",
                self.reducer.nodata_threshold
            )));
        }

        if !self.regions.file_template.contains("{epsg}") {
            return Err(IndicatorError::configuration(format!(
                "Region file template '{}' must contain '{{epsg}}'",
                self.regions.file_template
            )));
        }

        if self.regions.code_property.trim().is_empty() {
            return Err(IndicatorError::configuration(
                "Region code property cannot be empty",
            ));
        }

        if self.tiles.tiles_dir.is_none() && self.tiles.data_roots.is_empty() {
            return Err(IndicatorError::configuration(
                "Either a tiles directory or at least one data root is required",
            ));
        }

        if self.output.format == OutputFormat::Parquet && self.output.path.is_none() {
            return Err(IndicatorError::configuration(
                "Parquet output requires an output path",
            ));
        }

        Ok(())
    }

    pub fn with_tiles_dir(mut self, tiles_dir: impl Into<PathBuf>) -> Self {
        self.tiles.tiles_dir = Some(tiles_dir.into());
        self
    }

    pub fn with_regions_dir(mut self, regions_dir: impl Into<PathBuf>) -> Self {
        self.regions.regions_dir = regions_dir.into();
        self
    }

    pub fn with_nodata_threshold(mut self, threshold: f64) -> Self {
        self.reducer.nodata_threshold = threshold;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output.format = format;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.path = Some(path.into());
        self
    }
}
