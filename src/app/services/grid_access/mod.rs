//! Access to hourly yearly-cumulative rainfall grids
//!
//! A [`GridAccess`] resolves an hour to a [`RasterSnapshot`], trying the
//! data sources in [`DataSource::FALLBACK_ORDER`]. Absence of every source
//! is not an error: the hour simply has no data.

pub mod geotiff;

pub use geotiff::{GeoTiffRaster, read_geotiff, write_geotiff};

use crate::app::models::{DataSource, HourStamp, RasterSnapshot};
use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Provider of hourly yearly-cumulative snapshots
pub trait GridAccess {
    /// Snapshot for an hour, `Ok(None)` when no source has it
    fn fetch(&self, stamp: HourStamp) -> Result<Option<RasterSnapshot>>;
}

/// GeoTIFF tiles laid out as `{tiles}/{YYYY}/{MM}/{DD}/{stem}_{HH}_v00.tif`
#[derive(Debug, Clone)]
pub struct TileStore {
    tiles_dir: PathBuf,
}

impl TileStore {
    pub fn new(tiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            tiles_dir: tiles_dir.into(),
        }
    }

    pub fn tiles_dir(&self) -> &Path {
        &self.tiles_dir
    }

    /// First source, in fallback order, whose tile exists for the hour
    pub fn locate(&self, stamp: HourStamp) -> Option<(DataSource, PathBuf)> {
        DataSource::FALLBACK_ORDER.into_iter().find_map(|source| {
            let path = source.tile_path(&self.tiles_dir, stamp);
            path.is_file().then_some((source, path))
        })
    }
}

impl GridAccess for TileStore {
    fn fetch(&self, stamp: HourStamp) -> Result<Option<RasterSnapshot>> {
        let Some((source, path)) = self.locate(stamp) else {
            debug!("No tile for {} under {}", stamp, self.tiles_dir.display());
            return Ok(None);
        };

        debug!("Reading {} tile {}", source, path.display());
        let raster = read_geotiff(&path)?;

        Ok(Some(RasterSnapshot::new(
            raster.grid,
            raster.transform,
            raster.nodata,
            source,
            stamp,
        )))
    }
}

/// Snapshots held in memory, keyed by hour
#[derive(Debug, Clone, Default)]
pub struct MemoryGridAccess {
    snapshots: HashMap<HourStamp, RasterSnapshot>,
}

impl MemoryGridAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, snapshot: RasterSnapshot) {
        self.snapshots.insert(snapshot.stamp(), snapshot);
    }

    pub fn with_snapshot(mut self, snapshot: RasterSnapshot) -> Self {
        self.insert(snapshot);
        self
    }
}

impl GridAccess for MemoryGridAccess {
    fn fetch(&self, stamp: HourStamp) -> Result<Option<RasterSnapshot>> {
        Ok(self.snapshots.get(&stamp).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::GeoTransform;
    use chrono::NaiveDate;
    use ndarray::Array2;
    use std::fs;
    use tempfile::TempDir;

    fn stamp() -> HourStamp {
        HourStamp::day_start(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap())
    }

    fn write_tile(store: &TileStore, source: DataSource, value: f64) {
        let path = source.tile_path(store.tiles_dir(), stamp());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let grid = Array2::from_elem((2, 2), value);
        let transform = GeoTransform::north_up(0.0, 2.0, 1.0, -1.0);
        write_geotiff(&path, &grid, &transform, None).unwrap();
    }

    #[test]
    fn test_absent_everywhere_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = TileStore::new(temp_dir.path());

        assert!(store.locate(stamp()).is_none());
        assert!(store.fetch(stamp()).unwrap().is_none());
    }

    #[test]
    fn test_fallback_source_used_when_primary_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = TileStore::new(temp_dir.path());
        write_tile(&store, DataSource::Radaric, 7.0);

        let snapshot = store.fetch(stamp()).unwrap().unwrap();
        assert_eq!(snapshot.source(), DataSource::Radaric);
        assert_eq!(snapshot.grid()[[0, 0]], 7.0);
    }

    #[test]
    fn test_primary_source_preferred() {
        let temp_dir = TempDir::new().unwrap();
        let store = TileStore::new(temp_dir.path());
        write_tile(&store, DataSource::Radaric, 7.0);
        write_tile(&store, DataSource::Comephore, 3.0);

        let snapshot = store.fetch(stamp()).unwrap().unwrap();
        assert_eq!(snapshot.source(), DataSource::Comephore);
        assert_eq!(snapshot.grid()[[1, 1]], 3.0);
        assert_eq!(snapshot.stamp(), stamp());
    }

    #[test]
    fn test_unreadable_tile_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = TileStore::new(temp_dir.path());
        let path = DataSource::Comephore.tile_path(store.tiles_dir(), stamp());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"broken").unwrap();

        assert!(store.fetch(stamp()).is_err());
    }
}
