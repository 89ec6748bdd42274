//! Core data models for rainfall indicator computation
//!
//! This module contains the data structures that flow through the pipeline:
//! hourly raster snapshots and the data source that produced them, region
//! polygons, per-hour region statistics and the terminal daily indicator.

pub mod diagnostics;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLog};

use crate::constants::{
    COMEPHORE_TILE_STEM, DAY_START_HOUR, EPSG_WEB_MERCATOR, EPSG_WGS84, RADARIC_TILE_STEM,
    TILE_VERSION_SUFFIX, YEAR_BOUNDARY_HOUR,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use geo::MultiPolygon;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

// =============================================================================
// Reference Systems and Data Sources
// =============================================================================

/// Coordinate reference systems the pipeline works in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// WGS84 geographic (lon/lat degrees)
    Wgs84,
    /// Spherical Web Mercator (meters)
    WebMercator,
}

impl Crs {
    /// EPSG code of the reference system
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => EPSG_WGS84,
            Crs::WebMercator => EPSG_WEB_MERCATOR,
        }
    }

    /// Look up a supported reference system by EPSG code
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            EPSG_WGS84 => Some(Crs::Wgs84),
            EPSG_WEB_MERCATOR => Some(Crs::WebMercator),
            _ => None,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Upstream product serving yearly cumulative rainfall tiles
///
/// Each variant carries its reference system and file naming so that the
/// fallback lookup and the year-boundary discontinuity check only ever
/// compare variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Primary product, projected in Web Mercator
    Comephore,
    /// Fallback radar product, in geographic coordinates
    Radaric,
}

impl DataSource {
    /// Lookup order when resolving a tile for an hour
    pub const FALLBACK_ORDER: [DataSource; 2] = [DataSource::Comephore, DataSource::Radaric];

    /// Short tag written to the output rows
    pub fn tag(&self) -> &'static str {
        match self {
            DataSource::Comephore => "comephore",
            DataSource::Radaric => "radaric",
        }
    }

    /// Parse an output tag back into a source
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::FALLBACK_ORDER
            .into_iter()
            .find(|source| source.tag() == tag)
    }

    /// Reference system of the tiles and of the matching region catalog
    pub fn crs(&self) -> Crs {
        match self {
            DataSource::Comephore => Crs::WebMercator,
            DataSource::Radaric => Crs::Wgs84,
        }
    }

    /// File name stem shared by every tile of this product
    pub fn tile_stem(&self) -> &'static str {
        match self {
            DataSource::Comephore => COMEPHORE_TILE_STEM,
            DataSource::Radaric => RADARIC_TILE_STEM,
        }
    }

    /// File name of the yearly cumulative tile for an hour
    pub fn tile_file_name(&self, hour: u32) -> String {
        format!("{}_{:02}_{}.tif", self.tile_stem(), hour, TILE_VERSION_SUFFIX)
    }

    /// Full tile path: `{tiles}/{YYYY}/{MM}/{DD}/{stem}_{HH}_v00.tif`
    pub fn tile_path(&self, tiles_dir: &Path, stamp: HourStamp) -> PathBuf {
        tiles_dir
            .join(format!("{:04}", stamp.year()))
            .join(format!("{:02}", stamp.month()))
            .join(format!("{:02}", stamp.day()))
            .join(self.tile_file_name(stamp.hour()))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// Time
// =============================================================================

/// A UTC hour at which a yearly cumulative snapshot is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourStamp(NaiveDateTime);

impl HourStamp {
    /// Stamp at `hour`:00 UTC of `date`
    pub fn new(date: NaiveDate, hour: u32) -> Option<Self> {
        date.and_hms_opt(hour, 0, 0).map(Self)
    }

    /// Start of the rainfall day: `date` at 06:00 UTC
    pub fn day_start(date: NaiveDate) -> Self {
        Self(date.and_time(day_start_time()))
    }

    /// End of the rainfall day: `date + 1` at 06:00 UTC
    pub fn day_end(date: NaiveDate) -> Self {
        Self(date.and_time(day_start_time()) + Duration::hours(24))
    }

    /// First snapshot of the yearly counter following `date`'s year
    pub fn year_boundary(date: NaiveDate) -> Self {
        let new_year = NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap_or(date);
        Self(new_year.and_time(
            chrono::NaiveTime::from_hms_opt(YEAR_BOUNDARY_HOUR, 0, 0).unwrap_or_default(),
        ))
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }
}

fn day_start_time() -> chrono::NaiveTime {
    chrono::NaiveTime::from_hms_opt(DAY_START_HOUR, 0, 0).unwrap_or_default()
}

impl fmt::Display for HourStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Z", self.0.format("%Y-%m-%d %H:%M"))
    }
}

/// Whether a day needs the year-boundary treatment (December 31)
pub fn is_year_boundary_day(date: NaiveDate) -> bool {
    date.month() == 12 && date.day() == 31
}

// =============================================================================
// Rasters
// =============================================================================

/// Affine transform from pixel to map coordinates, in GDAL order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub column_rotation: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from the six GDAL coefficients
    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        Self {
            origin_x: coefficients[0],
            pixel_width: coefficients[1],
            row_rotation: coefficients[2],
            origin_y: coefficients[3],
            column_rotation: coefficients[4],
            pixel_height: coefficients[5],
        }
    }

    /// North-up transform without rotation
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::from_gdal([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.column_rotation,
            self.pixel_height,
        ]
    }

    /// Transform of a sub-window whose top-left pixel is at (`row_offset`, `col_offset`)
    pub fn for_window(&self, row_offset: i64, col_offset: i64) -> Self {
        Self {
            origin_x: self.origin_x + col_offset as f64 * self.pixel_width,
            pixel_width: self.pixel_width,
            row_rotation: 0.0,
            origin_y: self.origin_y + row_offset as f64 * self.pixel_height,
            column_rotation: 0.0,
            pixel_height: self.pixel_height,
        }
    }
}

/// One hour of yearly cumulative rainfall, as served by a data source
///
/// Never mutated after creation.
#[derive(Debug, Clone)]
pub struct RasterSnapshot {
    grid: Array2<f64>,
    transform: GeoTransform,
    nodata: Option<f64>,
    source: DataSource,
    stamp: HourStamp,
}

impl RasterSnapshot {
    pub fn new(
        grid: Array2<f64>,
        transform: GeoTransform,
        nodata: Option<f64>,
        source: DataSource,
        stamp: HourStamp,
    ) -> Self {
        Self {
            grid,
            transform,
            nodata,
            source,
            stamp,
        }
    }

    pub fn grid(&self) -> &Array2<f64> {
        &self.grid
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// No-data value declared by the file, kept for diagnostics only
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn stamp(&self) -> HourStamp {
        self.stamp
    }

    pub fn crs(&self) -> Crs {
        self.source.crs()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.grid.dim()
    }
}

/// Minimal raster sub-rectangle covering a region's envelope
///
/// Upper bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelWindow {
    pub row_start: i64,
    pub row_end: i64,
    pub col_start: i64,
    pub col_end: i64,
}

impl PixelWindow {
    pub fn rows(&self) -> i64 {
        self.row_end.saturating_sub(self.row_start)
    }

    pub fn cols(&self) -> i64 {
        self.col_end.saturating_sub(self.col_start)
    }

    /// Zero or negative extent along either axis
    pub fn is_degenerate(&self) -> bool {
        self.rows() <= 0 || self.cols() <= 0
    }

    /// Whether the window lies inside a grid of the given shape
    pub fn fits_within(&self, rows: usize, cols: usize) -> bool {
        self.row_start >= 0
            && self.col_start >= 0
            && self.row_end <= rows as i64
            && self.col_end <= cols as i64
    }
}

impl fmt::Display for PixelWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..{}, cols {}..{}",
            self.row_start, self.row_end, self.col_start, self.col_end
        )
    }
}

// =============================================================================
// Regions
// =============================================================================

/// An administrative region in one reference system
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPolygon {
    pub code: String,
    /// `None` when the catalog feature carries no geometry
    pub geometry: Option<MultiPolygon<f64>>,
    pub crs: Crs,
}

impl RegionPolygon {
    pub fn new(code: impl Into<String>, geometry: Option<MultiPolygon<f64>>, crs: Crs) -> Self {
        Self {
            code: code.into(),
            geometry,
            crs,
        }
    }
}

/// Why a region is absent from an hour's statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegionSkipReason {
    /// The catalog feature has no geometry
    MissingGeometry,
    /// The geometry has no bounding envelope (no coordinates)
    EmptyEnvelope,
    /// The envelope maps to no representable pixel window
    InvalidWindow,
    /// The derived pixel window has zero or negative extent
    DegenerateWindow { window: PixelWindow },
    /// The pixel window extends past the raster
    WindowOutOfBounds {
        window: PixelWindow,
        rows: usize,
        cols: usize,
    },
    /// Every pixel of the window was masked out
    EmptyReduction,
}

impl RegionSkipReason {
    /// Malformed-region skips as opposed to empty reductions
    pub fn is_malformed(&self) -> bool {
        !matches!(self, RegionSkipReason::EmptyReduction)
    }
}

impl fmt::Display for RegionSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSkipReason::MissingGeometry => f.write_str("feature has no geometry"),
            RegionSkipReason::EmptyEnvelope => f.write_str("geometry has no envelope"),
            RegionSkipReason::InvalidWindow => {
                f.write_str("envelope does not map to a pixel window")
            }
            RegionSkipReason::DegenerateWindow { window } => {
                write!(f, "pixel window has no extent ({})", window)
            }
            RegionSkipReason::WindowOutOfBounds { window, rows, cols } => write!(
                f,
                "pixel window ({}) outside raster of {}x{}",
                window, rows, cols
            ),
            RegionSkipReason::EmptyReduction => f.write_str("no valid pixel inside region"),
        }
    }
}

/// A region left out of an hour's statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSkip {
    pub code: String,
    pub reason: RegionSkipReason,
}

/// Mean yearly cumulative rainfall per region for one hour
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStats {
    pub source: DataSource,
    pub stamp: HourStamp,
    pub values: HashMap<String, f64>,
    pub skipped: Vec<RegionSkip>,
}

impl RegionStats {
    pub fn new(source: DataSource, stamp: HourStamp) -> Self {
        Self {
            source,
            stamp,
            values: HashMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Build from precomputed values (synthetic inputs, tests)
    pub fn from_values<I, K>(source: DataSource, stamp: HourStamp, values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            source,
            stamp,
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            skipped: Vec::new(),
        }
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.values.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// Daily Indicator
// =============================================================================

/// How a year-boundary day was reconstructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Same product on both sides of midnight: `boundary - start + end`
    Reconstructed,
    /// The product changed between the day start and the new year: the
    /// partial new-year accumulation `end` is used as-is.
    ///
    /// Kept as introduced for the radaric to comephore switch of 2019-12-31;
    /// not known to be right for other product transitions.
    SourceDiscontinuitySubstitution,
}

/// Which accumulation branch produced a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayBranch {
    Standard,
    YearBoundary(BoundaryPolicy),
}

/// 24-hour rainfall accumulation per region for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyIndicator {
    pub date: NaiveDate,
    pub values: HashMap<String, i64>,
    /// Mean over the regions present in `values`
    pub national_mean: f64,
    /// Source active at the start of the day
    pub source: DataSource,
    pub branch: DayBranch,
}

impl DailyIndicator {
    pub fn get(&self, code: &str) -> Option<i64> {
        self.values.get(code).copied()
    }

    pub fn region_count(&self) -> usize {
        self.values.len()
    }
}
