//! Daily series over a date range
//!
//! The driver walks the inclusive range day by day, resolves each day's
//! indicator and hands it to an [`IndicatorSink`]. Days without data are
//! left out of the output and reported in the [`RunSummary`].

pub mod sink;
pub mod summary;

pub use sink::{CsvSink, IndicatorSink, MemorySink, ParquetSink, header_fields, row_fields};
pub use summary::RunSummary;

use crate::app::models::DiagnosticLog;
use crate::app::services::accumulation::AccumulationResolver;
use crate::constants::GENERATED_AT_FORMAT;
use crate::error::{IndicatorError, Result};
use chrono::{Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{debug, info};

/// Generation timestamp shared by every row of a run, in local time
pub fn generation_timestamp() -> String {
    Local::now().format(GENERATED_AT_FORMAT).to_string()
}

/// Inclusive list of days, rejecting reversed ranges
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start > end {
        return Err(IndicatorError::InvalidDateRange { start, end });
    }
    Ok(start.iter_days().take_while(|day| *day <= end).collect())
}

/// Drives the accumulation resolver over a date range
pub struct SeriesDriver<'a> {
    resolver: AccumulationResolver<'a>,
    codes: &'a [String],
    show_progress: bool,
}

impl<'a> SeriesDriver<'a> {
    /// `codes` fixes the output columns, in order
    pub fn new(resolver: AccumulationResolver<'a>, codes: &'a [String]) -> Self {
        Self {
            resolver,
            codes,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Compute every day of `[start, end]` and write one row per day with data
    ///
    /// Rows are written in date order. Only sink failures and a reversed
    /// range are errors.
    pub fn run(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        sink: &mut dyn IndicatorSink,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let days = date_range(start, end)?;
        info!("Computing {} days from {} to {}", days.len(), start, end);

        let progress = self.progress_bar(days.len());
        let mut diagnostics = DiagnosticLog::new();
        let mut days_omitted = Vec::new();
        let mut days_written = 0;

        sink.write_header(self.codes)?;

        for day in &days {
            progress.set_message(day.to_string());
            match self.resolver.compute_daily_indicator(*day, &mut diagnostics) {
                Some(indicator) => {
                    sink.write_row(&indicator)?;
                    days_written += 1;
                }
                None => {
                    debug!("No row for {}", day);
                    days_omitted.push(*day);
                }
            }
            progress.inc(1);
        }

        sink.finish()?;
        progress.finish_and_clear();

        info!(
            "Wrote {} of {} days ({} diagnostics)",
            days_written,
            days.len(),
            diagnostics.len()
        );

        Ok(RunSummary {
            start,
            end,
            days_requested: days.len(),
            days_written,
            days_omitted,
            diagnostics,
            elapsed: started.elapsed(),
        })
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} days | {msg}")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{
        Crs, DataSource, DiagnosticKind, GeoTransform, HourStamp, RasterSnapshot, RegionPolygon,
    };
    use crate::app::services::grid_access::MemoryGridAccess;
    use crate::app::services::region_catalog::{MemoryRegionCatalog, RegionSet};
    use crate::app::services::zonal_reducer::ZonalReducer;
    use geo::{MultiPolygon, polygon};
    use ndarray::Array2;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn regions() -> RegionSet {
        let polygon = polygon![
            (x: 0.2, y: 0.2),
            (x: 1.8, y: 0.2),
            (x: 1.8, y: 1.8),
            (x: 0.2, y: 1.8),
        ];
        let region = RegionPolygon::new("01", Some(MultiPolygon::new(vec![polygon])), Crs::Wgs84);
        RegionSet::load(&MemoryRegionCatalog::new(vec![region])).unwrap()
    }

    fn snapshot(stamp: HourStamp, value: f64) -> RasterSnapshot {
        RasterSnapshot::new(
            Array2::from_elem((2, 2), value),
            GeoTransform::north_up(0.0, 2.0, 1.0, -1.0),
            None,
            DataSource::Radaric,
            stamp,
        )
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let days = date_range(date(2021, 2, 27), date(2021, 3, 1)).unwrap();
        assert_eq!(
            days,
            vec![date(2021, 2, 27), date(2021, 2, 28), date(2021, 3, 1)]
        );
        assert_eq!(date_range(date(2021, 3, 1), date(2021, 3, 1)).unwrap().len(), 1);
    }

    #[test]
    fn test_reversed_range_is_error() {
        let result = date_range(date(2021, 3, 2), date(2021, 3, 1));
        assert!(matches!(result, Err(IndicatorError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_days_without_data_are_omitted() {
        // Snapshots for Mar 1 06h, Mar 2 06h, Mar 3 06h; Mar 3 has no end snapshot
        let grid = MemoryGridAccess::new()
            .with_snapshot(snapshot(HourStamp::day_start(date(2021, 3, 1)), 10.0))
            .with_snapshot(snapshot(HourStamp::day_start(date(2021, 3, 2)), 12.0))
            .with_snapshot(snapshot(HourStamp::day_start(date(2021, 3, 3)), 15.0));
        let regions = regions();
        let resolver = AccumulationResolver::new(&grid, &regions, ZonalReducer::default());
        let driver = SeriesDriver::new(resolver, regions.codes());
        let mut sink = MemorySink::new();

        let summary = driver
            .run(date(2021, 3, 1), date(2021, 3, 3), &mut sink)
            .unwrap();

        assert_eq!(sink.dates(), vec![date(2021, 3, 1), date(2021, 3, 2)]);
        assert_eq!(sink.rows[0].get("01"), Some(2));
        assert_eq!(sink.rows[1].get("01"), Some(3));
        assert_eq!(sink.codes, vec!["01".to_string()]);
        assert!(sink.finished);

        assert_eq!(summary.days_requested, 3);
        assert_eq!(summary.days_written, 2);
        assert_eq!(summary.days_omitted, vec![date(2021, 3, 3)]);
        assert!(!summary.is_complete());
        assert_eq!(summary.diagnostics.count(DiagnosticKind::InputMissing), 1);
    }

    #[test]
    fn test_reversed_range_writes_nothing() {
        let grid = MemoryGridAccess::new();
        let regions = regions();
        let resolver = AccumulationResolver::new(&grid, &regions, ZonalReducer::default());
        let driver = SeriesDriver::new(resolver, regions.codes());
        let mut sink = MemorySink::new();

        assert!(driver.run(date(2021, 3, 3), date(2021, 3, 1), &mut sink).is_err());
        assert!(sink.codes.is_empty());
        assert!(!sink.finished);
    }

    #[test]
    fn test_generation_timestamp_format() {
        let stamp = generation_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, GENERATED_AT_FORMAT).is_ok());
    }
}
