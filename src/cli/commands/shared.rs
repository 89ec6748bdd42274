//! Shared components for CLI commands
//!
//! Logging setup, layered configuration loading and the series run used by
//! both the range and the realtime commands.

use crate::app::services::accumulation::AccumulationResolver;
use crate::app::services::grid_access::TileStore;
use crate::app::services::region_catalog::{GeoJsonRegionCatalog, RegionSet};
use crate::app::services::series::{
    CsvSink, IndicatorSink, ParquetSink, RunSummary, SeriesDriver, generation_timestamp,
};
use crate::app::services::zonal_reducer::ZonalReducer;
use crate::cli::args::{RunOptions, Verbosity};
use crate::config::{IndicatorConfig, OutputConfig, OutputFormat};
use crate::error::{IndicatorError, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info, warn};

/// Set up structured logging on standard error
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn setup_logging(verbosity: &Verbosity) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = verbosity.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rainfall_indicator={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| IndicatorError::configuration(format!("Failed to set up logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (file -> env -> args)
pub fn load_configuration(options: &RunOptions) -> Result<IndicatorConfig> {
    info!("Loading configuration");

    if let Some(path) = &options.config_file {
        info!("Using config file: {}", path.display());
    }

    let mut config = IndicatorConfig::load_layered(options.config_file.as_deref())?;
    apply_cli_overrides(&mut config, options);
    config.validate()?;

    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut IndicatorConfig, options: &RunOptions) {
    if let Some(tiles_dir) = &options.tiles_dir {
        config.tiles.tiles_dir = Some(tiles_dir.clone());
    }
    if let Some(regions_dir) = &options.regions_dir {
        config.regions.regions_dir = regions_dir.clone();
    }
    if let Some(threshold) = options.nodata_threshold {
        config.reducer.nodata_threshold = threshold;
    }
    if let Some(format) = options.format {
        config.output.format = format;
    }
    if let Some(output) = &options.output {
        config.output.path = Some(output.clone());
    }
}

/// Sink for the configured output
pub fn open_sink(output: &OutputConfig, generated_at: String) -> Result<Box<dyn IndicatorSink>> {
    match (output.format, &output.path) {
        (OutputFormat::Csv, None) => Ok(Box::new(CsvSink::stdout(generated_at))),
        (OutputFormat::Csv, Some(path)) => Ok(Box::new(CsvSink::create(path, generated_at)?)),
        (OutputFormat::Parquet, Some(path)) => {
            Ok(Box::new(ParquetSink::new(path.clone(), generated_at)))
        }
        (OutputFormat::Parquet, None) => Err(IndicatorError::configuration(
            "Parquet output requires an output path",
        )),
    }
}

/// Compute `[start, end]` with the configured inputs and output
pub fn run_series(
    config: &IndicatorConfig,
    start: NaiveDate,
    end: NaiveDate,
    verbosity: &Verbosity,
) -> Result<RunSummary> {
    let tiles_dir = config.tiles.resolve_tiles_dir();
    info!("Tiles directory: {}", tiles_dir.display());
    warn_if_missing(&tiles_dir);

    let grid = TileStore::new(tiles_dir);
    let catalog = GeoJsonRegionCatalog::new(config.regions.clone());
    let regions = RegionSet::load(&catalog)?;
    let reducer = ZonalReducer::from_config(&config.reducer);

    let resolver = AccumulationResolver::new(&grid, &regions, reducer);
    let driver =
        SeriesDriver::new(resolver, regions.codes()).with_progress(verbosity.show_progress());

    let mut sink = open_sink(&config.output, generation_timestamp())?;
    let summary = driver.run(start, end, sink.as_mut())?;

    if verbosity.show_progress() {
        summary.print_report();
    }
    Ok(summary)
}

fn warn_if_missing(tiles_dir: &Path) {
    if !tiles_dir.is_dir() {
        warn!(
            "Tiles directory {} does not exist; every day will be omitted",
            tiles_dir.display()
        );
    }
}
