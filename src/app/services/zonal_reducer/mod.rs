//! Zonal reduction of a raster snapshot to one mean value per region
//!
//! For each region the reducer:
//! 1. derives the smallest pixel window covering the region's envelope
//! 2. rasterizes the region onto that window (pixel-center rule)
//! 3. averages the raw values of pixels inside the region, dropping values
//!    above the sentinel threshold and non-finite values
//!
//! Regions that cannot be reduced are reported as skips, never as errors.

pub mod rasterize;
pub mod window;

pub use rasterize::rasterize_mask;
pub use window::{Envelope, envelope, pixel_window};

use crate::app::models::{RasterSnapshot, RegionPolygon, RegionSkip, RegionSkipReason, RegionStats};
use crate::config::ReducerConfig;
use crate::constants::{MASK_BURN_VALUE, NODATA_SENTINEL_THRESHOLD};
use ndarray::{Zip, s};
use tracing::{debug, trace};

/// Per-region mean of a raster snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonalReducer {
    nodata_threshold: f64,
}

impl Default for ZonalReducer {
    fn default() -> Self {
        Self::new(NODATA_SENTINEL_THRESHOLD)
    }
}

impl ZonalReducer {
    pub fn new(nodata_threshold: f64) -> Self {
        Self { nodata_threshold }
    }

    pub fn from_config(config: &ReducerConfig) -> Self {
        Self::new(config.nodata_threshold)
    }

    pub fn nodata_threshold(&self) -> f64 {
        self.nodata_threshold
    }

    /// Mean value of every reducible region for one snapshot
    ///
    /// Regions must be expressed in the snapshot's reference system. Skipped
    /// regions are listed in [`RegionStats::skipped`] in catalog order.
    pub fn compute_hour_stats(
        &self,
        snapshot: &RasterSnapshot,
        regions: &[RegionPolygon],
    ) -> RegionStats {
        let mut stats = RegionStats::new(snapshot.source(), snapshot.stamp());

        for region in regions {
            match self.reduce_region(snapshot, region) {
                Ok(mean) => {
                    trace!("{} region {}: mean {}", snapshot.stamp(), region.code, mean);
                    stats.values.insert(region.code.clone(), mean);
                }
                Err(reason) => stats.skipped.push(RegionSkip {
                    code: region.code.clone(),
                    reason,
                }),
            }
        }

        debug!(
            "Reduced {} {}: {} regions, {} skipped",
            snapshot.source(),
            snapshot.stamp(),
            stats.len(),
            stats.skipped.len()
        );

        stats
    }

    /// Mean of the valid pixels inside one region
    pub fn reduce_region(
        &self,
        snapshot: &RasterSnapshot,
        region: &RegionPolygon,
    ) -> Result<f64, RegionSkipReason> {
        let geometry = region
            .geometry
            .as_ref()
            .ok_or(RegionSkipReason::MissingGeometry)?;
        let envelope = envelope(geometry).ok_or(RegionSkipReason::EmptyEnvelope)?;

        let transform = snapshot.transform();
        let window =
            pixel_window(&envelope, transform).ok_or(RegionSkipReason::InvalidWindow)?;
        if window.is_degenerate() {
            return Err(RegionSkipReason::DegenerateWindow { window });
        }

        let (rows, cols) = snapshot.shape();
        if !window.fits_within(rows, cols) {
            return Err(RegionSkipReason::WindowOutOfBounds { window, rows, cols });
        }

        let local = transform.for_window(window.row_start, window.col_start);
        let mask = rasterize_mask(
            geometry,
            &local,
            window.rows() as usize,
            window.cols() as usize,
        );
        let values = snapshot.grid().slice(s![
            window.row_start as usize..window.row_end as usize,
            window.col_start as usize..window.col_end as usize
        ]);

        let mut sum = 0.0;
        let mut count = 0usize;
        Zip::from(&values).and(&mask).for_each(|&value, &inside| {
            if inside == MASK_BURN_VALUE && value.is_finite() && value <= self.nodata_threshold {
                sum += value;
                count += 1;
            }
        });

        if count == 0 {
            return Err(RegionSkipReason::EmptyReduction);
        }
        Ok(sum / count as f64)
    }
}
