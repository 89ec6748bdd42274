//! Application constants for the rainfall indicator
//!
//! Fixed values of the computation (daily window, reference systems, file
//! naming) and the defaults used by [`crate::config::IndicatorConfig`].

// =============================================================================
// Daily Window
// =============================================================================

/// Hour (UTC) at which the rainfall day starts and ends.
///
/// A day D covers 06:00 UTC on D (inclusive) to 06:00 UTC on D+1 (exclusive).
pub const DAY_START_HOUR: u32 = 6;

/// Hour (UTC) of the snapshot holding the start of a new yearly counter.
pub const YEAR_BOUNDARY_HOUR: u32 = 0;

// =============================================================================
// Masking
// =============================================================================

/// Raw values above this are treated as no-data.
///
/// Known approximation: the yearly rasters are meant to be masked on exact
/// equality with their no-data value, but the rasterized tiles carry large
/// fill values that do not compare equal. Overridable through
/// `reducer.nodata_threshold`.
pub const NODATA_SENTINEL_THRESHOLD: f64 = 50_000.0;

/// Value burnt into the region mask for pixels inside the polygon.
pub const MASK_BURN_VALUE: u8 = 1;

// =============================================================================
// Reference Systems
// =============================================================================

/// WGS84 geographic coordinates
pub const EPSG_WGS84: u32 = 4326;

/// Spherical Web Mercator
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// Earth radius used by the spherical Web Mercator projection (meters)
pub const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

// =============================================================================
// Tiles
// =============================================================================

/// Candidate data roots, tried in order when no tiles directory is configured.
pub const DEFAULT_DATA_ROOTS: &[&str] = &["/media/datastore", "/var/data"];

/// Tiles location below the data root.
pub const TILES_SUBDIR: &str = "tempsreel.infoclimat.net/tiles";

/// Yearly cumulative tile name stem of the primary product
pub const COMEPHORE_TILE_STEM: &str = "ac_yearly_comephore";

/// Yearly cumulative tile name stem of the fallback product
pub const RADARIC_TILE_STEM: &str = "ac_yearly_radaricval";

/// Product version suffix of the tiles
pub const TILE_VERSION_SUFFIX: &str = "v00";

// =============================================================================
// Regions
// =============================================================================

/// Default region catalog file name, `{epsg}` is replaced by the zero-padded EPSG code.
pub const DEFAULT_REGION_FILE_TEMPLATE: &str = "departements_{epsg}.geojson";

/// Feature property holding the region code
pub const DEFAULT_REGION_CODE_PROPERTY: &str = "CODE_DEPT";

/// Default region catalog directory
pub const DEFAULT_REGIONS_DIR: &str = "regions";

// =============================================================================
// Output
// =============================================================================

/// Leading date columns of an output row
pub const DATE_COLUMNS: &[&str] = &["annee", "mois", "jour"];

/// Prefix of the per-region columns
pub const REGION_COLUMN_PREFIX: &str = "d";

/// Nationwide mean column
pub const NATIONAL_COLUMN: &str = "FR";

/// Governing source column
pub const SOURCE_COLUMN: &str = "source";

/// Generation timestamp column
pub const GENERATED_AT_COLUMN: &str = "dh_maj";

/// Generation timestamp format
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Days covered by the realtime command before today
pub const DEFAULT_REALTIME_DAYS: u32 = 3;

/// Application name used for config directories and the env prefix
pub const APP_NAME: &str = "rainfall-indicator";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "RAINFALL_INDICATOR";
