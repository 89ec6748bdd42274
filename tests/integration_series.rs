//! End-to-end tests of the daily series: snapshots in, rows out

use chrono::NaiveDate;
use geo::{Coord, MultiPolygon, polygon};
use ndarray::Array2;
use rainfall_indicator::app::models::{
    BoundaryPolicy, Crs, DataSource, DayBranch, GeoTransform, HourStamp, RasterSnapshot,
    RegionPolygon,
};
use rainfall_indicator::app::services::accumulation::AccumulationResolver;
use rainfall_indicator::app::services::grid_access::{MemoryGridAccess, geotiff::write_geotiff};
use rainfall_indicator::app::services::region_catalog::reproject::wgs84_to_web_mercator;
use rainfall_indicator::app::services::region_catalog::{MemoryRegionCatalog, RegionSet};
use rainfall_indicator::app::services::series::{CsvSink, MemorySink, SeriesDriver};
use rainfall_indicator::app::services::zonal_reducer::ZonalReducer;
use rainfall_indicator::cli::args::Verbosity;
use rainfall_indicator::cli::commands::shared::run_series;
use rainfall_indicator::config::IndicatorConfig;
use rainfall_indicator::{DiagnosticKind, IndicatorError};
use std::fs;
use tempfile::TempDir;

const GENERATED_AT: &str = "2024-01-05 07:12:00";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn square(code: &str, min_x: f64, max_x: f64) -> RegionPolygon {
    let polygon = polygon![
        (x: min_x, y: 0.2),
        (x: max_x, y: 0.2),
        (x: max_x, y: 1.8),
        (x: min_x, y: 1.8),
    ];
    RegionPolygon::new(code, Some(MultiPolygon::new(vec![polygon])), Crs::Wgs84)
}

/// Regions "01" over the two left columns and "02" over the two right ones
fn two_regions() -> RegionSet {
    let catalog = MemoryRegionCatalog::new(vec![square("01", 0.2, 1.8), square("02", 2.2, 3.8)]);
    RegionSet::load(&catalog).unwrap()
}

/// 2 x 4 lon/lat grid, `left` under region 01 and `right` under region 02
fn radaric(stamp: HourStamp, left: f64, right: f64) -> RasterSnapshot {
    let grid = Array2::from_shape_fn((2, 4), |(_, c)| if c < 2 { left } else { right });
    RasterSnapshot::new(
        grid,
        GeoTransform::north_up(0.0, 2.0, 1.0, -1.0),
        None,
        DataSource::Radaric,
        stamp,
    )
}

/// Uniform 5 x 5 Web Mercator grid covering lon/lat 0..2.2
fn comephore(stamp: HourStamp, value: f64) -> RasterSnapshot {
    RasterSnapshot::new(
        Array2::from_elem((5, 5), value),
        GeoTransform::north_up(0.0, 250_000.0, 50_000.0, -50_000.0),
        None,
        DataSource::Comephore,
        stamp,
    )
}

#[test]
fn test_series_across_new_year() {
    let grid = MemoryGridAccess::new()
        .with_snapshot(radaric(HourStamp::day_start(date(2020, 12, 31)), 900.0, 1800.0))
        .with_snapshot(radaric(HourStamp::year_boundary(date(2020, 12, 31)), 905.0, 1810.0))
        .with_snapshot(radaric(HourStamp::day_start(date(2021, 1, 1)), 1.0, 2.0))
        .with_snapshot(radaric(HourStamp::day_start(date(2021, 1, 2)), 4.0, 8.0))
        .with_snapshot(radaric(HourStamp::day_start(date(2021, 1, 3)), 10.0, 20.0));
    let regions = two_regions();
    let resolver = AccumulationResolver::new(&grid, &regions, ZonalReducer::default());
    let driver = SeriesDriver::new(resolver, regions.codes());

    let mut memory = MemorySink::new();
    let summary = driver
        .run(date(2020, 12, 31), date(2021, 1, 2), &mut memory)
        .unwrap();

    assert!(summary.is_complete());
    assert_eq!(
        memory.dates(),
        vec![date(2020, 12, 31), date(2021, 1, 1), date(2021, 1, 2)]
    );
    assert_eq!(
        memory.rows[0].branch,
        DayBranch::YearBoundary(BoundaryPolicy::Reconstructed)
    );
    assert_eq!(memory.rows[1].branch, DayBranch::Standard);
    assert_eq!(memory.rows[2].branch, DayBranch::Standard);

    let mut csv = CsvSink::new(Vec::new(), GENERATED_AT);
    driver
        .run(date(2020, 12, 31), date(2021, 1, 2), &mut csv)
        .unwrap();
    let text = String::from_utf8(csv.into_inner().unwrap()).unwrap();

    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "annee,mois,jour,d01,d02,FR,source,dh_maj",
            "2020,12,31,6,12,9,radaric,2024-01-05 07:12:00",
            "2021,1,1,3,6,4.5,radaric,2024-01-05 07:12:00",
            "2021,1,2,6,12,9,radaric,2024-01-05 07:12:00",
        ]
    );
}

#[test]
fn test_product_switch_on_new_year() {
    // Day starts on the secondary product, the new year opens on the primary one
    let grid = MemoryGridAccess::new()
        .with_snapshot(radaric(HourStamp::day_start(date(2019, 12, 31)), 10.0, 10.0))
        .with_snapshot(comephore(HourStamp::year_boundary(date(2019, 12, 31)), 10.0))
        .with_snapshot(comephore(HourStamp::day_start(date(2020, 1, 1)), 12.0));
    let catalog = MemoryRegionCatalog::new(vec![square("01", 0.2, 1.8)]);
    let regions = RegionSet::load(&catalog).unwrap();
    let resolver = AccumulationResolver::new(&grid, &regions, ZonalReducer::default());
    let driver = SeriesDriver::new(resolver, regions.codes());

    let mut sink = MemorySink::new();
    let summary = driver
        .run(date(2019, 12, 31), date(2019, 12, 31), &mut sink)
        .unwrap();

    assert_eq!(sink.rows.len(), 1);
    let row = &sink.rows[0];
    assert_eq!(row.get("01"), Some(12));
    assert_eq!(row.source, DataSource::Radaric);
    assert_eq!(
        row.branch,
        DayBranch::YearBoundary(BoundaryPolicy::SourceDiscontinuitySubstitution)
    );
    assert_eq!(
        summary
            .diagnostics
            .count(DiagnosticKind::SourceDiscontinuity),
        1
    );
}

#[test]
fn test_mercator_grid_covers_test_region() {
    // Guards the geometry used by the product switch test
    let corner = wgs84_to_web_mercator(Coord { x: 1.8, y: 1.8 });
    assert!(corner.x < 250_000.0);
    assert!(corner.y < 250_000.0);
}

fn write_catalog(dir: &std::path::Path) {
    let catalog = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"CODE_DEPT": "29"},
                "geometry": {"type": "Polygon", "coordinates": [[[0.2,0.2],[1.8,0.2],[1.8,1.8],[0.2,1.8],[0.2,0.2]]]}
            },
            {
                "type": "Feature",
                "properties": {"CODE_DEPT": "2A"},
                "geometry": {"type": "Polygon", "coordinates": [[[2.2,0.2],[3.8,0.2],[3.8,1.8],[2.2,1.8],[2.2,0.2]]]}
            }
        ]
    }"#;
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("departements_4326.geojson"), catalog).unwrap();
}

fn write_tile(tiles_dir: &std::path::Path, stamp: HourStamp, left: f64, right: f64) {
    let snapshot = radaric(stamp, left, right);
    let path = DataSource::Radaric.tile_path(tiles_dir, stamp);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    write_geotiff(&path, snapshot.grid(), snapshot.transform(), Some(-9999.0)).unwrap();
}

#[test]
fn test_run_from_files_to_csv() {
    let temp_dir = TempDir::new().unwrap();
    let tiles_dir = temp_dir.path().join("tiles");
    let regions_dir = temp_dir.path().join("regions");
    let output = temp_dir.path().join("indicator.csv");

    write_catalog(&regions_dir);
    write_tile(&tiles_dir, HourStamp::day_start(date(2021, 3, 1)), 10.0, 100.0);
    write_tile(&tiles_dir, HourStamp::day_start(date(2021, 3, 2)), 12.0, 103.0);
    write_tile(&tiles_dir, HourStamp::day_start(date(2021, 3, 3)), 15.0, 60_000.0);

    let config = IndicatorConfig::default()
        .with_tiles_dir(&tiles_dir)
        .with_regions_dir(&regions_dir)
        .with_output_path(&output);
    let verbosity = Verbosity {
        quiet: true,
        ..Default::default()
    };

    let summary = run_series(&config, date(2021, 3, 1), date(2021, 3, 3), &verbosity).unwrap();

    // The Mar 3 tile is no-data over 2A: Mar 2 loses that region, Mar 3
    // reduces the tile as its start and then finds no end tile
    assert_eq!(summary.days_written, 2);
    assert_eq!(summary.days_omitted, vec![date(2021, 3, 3)]);
    assert_eq!(summary.diagnostics.count(DiagnosticKind::EmptyReduction), 2);
    assert_eq!(summary.diagnostics.count(DiagnosticKind::InputMissing), 1);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "annee,mois,jour,d29,d2A,FR,source,dh_maj");
    assert!(lines[1].starts_with("2021,3,1,2,3,2.5,radaric,"));
    assert!(lines[2].starts_with("2021,3,2,3,,3,radaric,"));
}

#[test]
fn test_missing_catalog_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config = IndicatorConfig::default()
        .with_tiles_dir(temp_dir.path().join("tiles"))
        .with_regions_dir(temp_dir.path().join("regions"))
        .with_output_path(temp_dir.path().join("out.csv"));

    let result = run_series(
        &config,
        date(2021, 3, 1),
        date(2021, 3, 1),
        &Verbosity::default(),
    );

    assert!(matches!(result, Err(IndicatorError::RegionCatalog { .. })));
}
