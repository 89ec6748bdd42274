//! GeoJSON region catalog
//!
//! One FeatureCollection per reference system. Feature order is the catalog
//! order; features without a usable polygon geometry are kept with no
//! geometry so that the reducer reports them.

use super::RegionCatalog;
use super::reproject::reproject_regions;
use crate::app::models::{Crs, RegionPolygon};
use crate::config::RegionsConfig;
use crate::error::{IndicatorError, Result};
use geo::{Geometry, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Region catalog backed by per-CRS GeoJSON files
#[derive(Debug, Clone)]
pub struct GeoJsonRegionCatalog {
    config: RegionsConfig,
}

impl GeoJsonRegionCatalog {
    pub fn new(config: RegionsConfig) -> Self {
        Self { config }
    }
}

impl RegionCatalog for GeoJsonRegionCatalog {
    fn list(&self, crs: Crs) -> Result<Vec<RegionPolygon>> {
        let path = self.config.file_for(crs);
        if path.is_file() {
            return load_regions(&path, &self.config.code_property, crs);
        }

        let wgs84_path = self.config.file_for(Crs::Wgs84);
        if crs != Crs::Wgs84 && wgs84_path.is_file() {
            info!(
                "No catalog at {}, reprojecting {} to {}",
                path.display(),
                wgs84_path.display(),
                crs
            );
            let regions = load_regions(&wgs84_path, &self.config.code_property, Crs::Wgs84)?;
            return Ok(reproject_regions(&regions, crs));
        }

        Err(IndicatorError::region_catalog(
            path,
            "catalog file not found",
        ))
    }
}

/// Load a FeatureCollection file as regions in `crs`
pub fn load_regions(path: &Path, code_property: &str, crs: Crs) -> Result<Vec<RegionPolygon>> {
    let text = fs::read_to_string(path)
        .map_err(|e| IndicatorError::io(format!("Failed to read {}", path.display()), e))?;
    let regions = parse_regions(&text, code_property, crs)
        .map_err(|reason| IndicatorError::region_catalog(path, reason))?;

    debug!(
        "Loaded {} regions from {} ({})",
        regions.len(),
        path.display(),
        crs
    );
    Ok(regions)
}

/// Parse a FeatureCollection document into regions
pub fn parse_regions(
    text: &str,
    code_property: &str,
    crs: Crs,
) -> std::result::Result<Vec<RegionPolygon>, String> {
    let document: GeoJson = text.parse().map_err(|e: geojson::Error| e.to_string())?;
    let collection = FeatureCollection::try_from(document).map_err(|e| e.to_string())?;

    let mut regions = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let code = match feature.property(code_property) {
            Some(JsonValue::String(code)) => code.clone(),
            Some(JsonValue::Number(code)) => code.to_string(),
            _ => {
                return Err(format!(
                    "feature {} has no '{}' property",
                    index, code_property
                ));
            }
        };

        let geometry = feature
            .geometry
            .and_then(|geometry| match Geometry::<f64>::try_from(geometry) {
                Ok(Geometry::Polygon(polygon)) => Some(MultiPolygon::new(vec![polygon])),
                Ok(Geometry::MultiPolygon(multi)) => Some(multi),
                Ok(other) => {
                    warn!("Region {} has non-polygon geometry {:?}", code, other);
                    None
                }
                Err(e) => {
                    warn!("Region {} has unreadable geometry: {}", code, e);
                    None
                }
            });

        regions.push(RegionPolygon::new(code, geometry, crs));
    }

    Ok(regions)
}
