//! Reprojection of region geometries between the supported reference systems

use crate::app::models::{Crs, RegionPolygon};
use crate::constants::WEB_MERCATOR_RADIUS;
use geo::{Coord, MapCoords, MultiPolygon};
use std::f64::consts::FRAC_PI_4;

/// Project WGS84 lon/lat (degrees) to spherical Web Mercator (meters)
pub fn wgs84_to_web_mercator(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: WEB_MERCATOR_RADIUS * coord.x.to_radians(),
        y: WEB_MERCATOR_RADIUS * (FRAC_PI_4 + coord.y.to_radians() / 2.0).tan().ln(),
    }
}

/// Inverse of [`wgs84_to_web_mercator`]
pub fn web_mercator_to_wgs84(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / WEB_MERCATOR_RADIUS).to_degrees(),
        y: (2.0 * (coord.y / WEB_MERCATOR_RADIUS).exp().atan() - 2.0 * FRAC_PI_4).to_degrees(),
    }
}

fn project_geometry(geometry: &MultiPolygon<f64>, from: Crs, to: Crs) -> MultiPolygon<f64> {
    match (from, to) {
        (Crs::Wgs84, Crs::WebMercator) => geometry.map_coords(wgs84_to_web_mercator),
        (Crs::WebMercator, Crs::Wgs84) => geometry.map_coords(web_mercator_to_wgs84),
        _ => geometry.clone(),
    }
}

/// Reproject a region set, preserving order and missing geometries
pub fn reproject_regions(regions: &[RegionPolygon], to: Crs) -> Vec<RegionPolygon> {
    regions
        .iter()
        .map(|region| RegionPolygon {
            code: region.code.clone(),
            geometry: region
                .geometry
                .as_ref()
                .map(|g| project_geometry(g, region.crs, to)),
            crs: to,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::polygon;

    #[test]
    fn test_origin_maps_to_origin() {
        let projected = wgs84_to_web_mercator(Coord { x: 0.0, y: 0.0 });
        assert_abs_diff_eq!(projected.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(projected.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_antimeridian_x() {
        let projected = wgs84_to_web_mercator(Coord { x: 180.0, y: 0.0 });
        assert_abs_diff_eq!(projected.x, 20_037_508.342789244, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip_over_france() {
        let paris = Coord { x: 2.35, y: 48.85 };
        let back = web_mercator_to_wgs84(wgs84_to_web_mercator(paris));
        assert_abs_diff_eq!(back.x, paris.x, epsilon = 1e-9);
        assert_abs_diff_eq!(back.y, paris.y, epsilon = 1e-9);
    }

    #[test]
    fn test_reproject_keeps_order_and_missing_geometry() {
        let square = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]]);
        let regions = vec![
            RegionPolygon::new("01", Some(square), Crs::Wgs84),
            RegionPolygon::new("02", None, Crs::Wgs84),
        ];

        let projected = reproject_regions(&regions, Crs::WebMercator);

        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].code, "01");
        assert_eq!(projected[0].crs, Crs::WebMercator);
        assert!(projected[1].geometry.is_none());
        let first = projected[0].geometry.as_ref().unwrap().0[0].exterior().0[1];
        assert_abs_diff_eq!(first.x, 111_319.49079327357, epsilon = 1e-6);
    }
}
