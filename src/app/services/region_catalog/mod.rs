//! Region catalog: the fixed, ordered set of administrative regions
//!
//! The same regions are served in each supported reference system. A run
//! loads every variant once through [`RegionSet::load`]; output columns
//! follow the WGS84 catalog order.

pub mod geojson_catalog;
pub mod reproject;

pub use geojson_catalog::{GeoJsonRegionCatalog, load_regions, parse_regions};
pub use reproject::reproject_regions;

use crate::app::models::{Crs, DataSource, RegionPolygon};
use crate::error::{IndicatorError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Provider of region polygons per reference system
pub trait RegionCatalog {
    /// Regions in catalog order, expressed in `crs`
    fn list(&self, crs: Crs) -> Result<Vec<RegionPolygon>>;
}

/// Regions held in memory in one reference system
///
/// Other reference systems are served by reprojection.
#[derive(Debug, Clone)]
pub struct MemoryRegionCatalog {
    regions: Vec<RegionPolygon>,
}

impl MemoryRegionCatalog {
    pub fn new(regions: Vec<RegionPolygon>) -> Self {
        Self { regions }
    }
}

impl RegionCatalog for MemoryRegionCatalog {
    fn list(&self, crs: Crs) -> Result<Vec<RegionPolygon>> {
        if self.regions.iter().all(|r| r.crs == crs) {
            Ok(self.regions.clone())
        } else {
            Ok(reproject_regions(&self.regions, crs))
        }
    }
}

/// Regions of a run, loaded once for every data source's reference system
#[derive(Debug, Clone)]
pub struct RegionSet {
    by_crs: HashMap<Crs, Vec<RegionPolygon>>,
    codes: Vec<String>,
}

impl RegionSet {
    /// Load the regions for every reference system a data source may need
    pub fn load(catalog: &dyn RegionCatalog) -> Result<Self> {
        let reference = catalog.list(Crs::Wgs84)?;
        let codes: Vec<String> = reference.iter().map(|r| r.code.clone()).collect();

        let mut by_crs = HashMap::new();
        by_crs.insert(Crs::Wgs84, reference);

        for source in DataSource::FALLBACK_ORDER {
            let crs = source.crs();
            if by_crs.contains_key(&crs) {
                continue;
            }

            let mut regions = catalog.list(crs)?;
            let variant_codes: Vec<&str> = regions.iter().map(|r| r.code.as_str()).collect();
            if variant_codes != codes.iter().map(String::as_str).collect::<Vec<_>>() {
                warn!(
                    "Region codes in {} differ from {}; output columns follow {}",
                    crs,
                    Crs::Wgs84,
                    Crs::Wgs84
                );
            }

            // Regions without an output column never reach a row or the mean
            regions.retain(|region| {
                let known = codes.contains(&region.code);
                if !known {
                    warn!("Ignoring region {} of {}: not in {}", region.code, crs, Crs::Wgs84);
                }
                known
            });
            by_crs.insert(crs, regions);
        }

        if codes.is_empty() {
            return Err(IndicatorError::region_catalog(
                PathBuf::new(),
                "catalog contains no regions",
            ));
        }

        info!("Loaded {} regions", codes.len());
        Ok(Self { by_crs, codes })
    }

    /// Regions matching a data source's reference system
    pub fn for_source(&self, source: DataSource) -> &[RegionPolygon] {
        self.by_crs
            .get(&source.crs())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Region codes in output column order
    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}
