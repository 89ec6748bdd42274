//! Daily accumulation from hourly yearly-cumulative snapshots
//!
//! A day D runs from 06:00 UTC on D to 06:00 UTC on D+1. Standard days need
//! the two snapshots bounding that window; December 31 also needs the
//! January 1 00:00 snapshot, where the yearly counter restarts.

pub mod policy;

pub use policy::{
    accumulate_standard, accumulate_year_boundary, boundary_policy, national_mean, round_value,
};

use crate::app::models::{
    BoundaryPolicy, DailyIndicator, DayBranch, DiagnosticLog, HourStamp, RegionStats,
    is_year_boundary_day,
};
use crate::app::services::grid_access::GridAccess;
use crate::app::services::region_catalog::RegionSet;
use crate::app::services::zonal_reducer::ZonalReducer;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Resolves one day's indicator from the grids and regions of a run
pub struct AccumulationResolver<'a> {
    grid: &'a dyn GridAccess,
    regions: &'a RegionSet,
    reducer: ZonalReducer,
}

impl<'a> AccumulationResolver<'a> {
    pub fn new(grid: &'a dyn GridAccess, regions: &'a RegionSet, reducer: ZonalReducer) -> Self {
        Self {
            grid,
            regions,
            reducer,
        }
    }

    /// Indicator for `day`, or `None` when the day must be omitted
    ///
    /// Every reason for omitting the day, and every region left out, is
    /// recorded in `diagnostics`.
    pub fn compute_daily_indicator(
        &self,
        day: NaiveDate,
        diagnostics: &mut DiagnosticLog,
    ) -> Option<DailyIndicator> {
        let start = self.required_stats(day, HourStamp::day_start(day), diagnostics)?;
        let end = self.required_stats(day, HourStamp::day_end(day), diagnostics)?;

        let (values, branch) = if is_year_boundary_day(day) {
            let boundary = self.required_stats(day, HourStamp::year_boundary(day), diagnostics)?;
            let (values, policy) = accumulate_year_boundary(&start, &boundary, &end);
            if policy == BoundaryPolicy::SourceDiscontinuitySubstitution {
                diagnostics.source_discontinuity(
                    day,
                    format!(
                        "{} at {} but {} at {}; new-year accumulation used as-is",
                        start.source, start.stamp, boundary.source, boundary.stamp
                    ),
                );
            }
            (values, DayBranch::YearBoundary(policy))
        } else {
            (accumulate_standard(&start, &end), DayBranch::Standard)
        };

        let Some(national_mean) = national_mean(&values) else {
            diagnostics.day_omitted(day, "no region survived reduction");
            return None;
        };

        debug!(
            "{}: {} regions, mean {} ({:?}, {})",
            day,
            values.len(),
            national_mean,
            branch,
            start.source
        );

        Some(DailyIndicator {
            date: day,
            values,
            national_mean,
            source: start.source,
            branch,
        })
    }

    /// Statistics for an hour the day cannot do without
    fn required_stats(
        &self,
        day: NaiveDate,
        stamp: HourStamp,
        diagnostics: &mut DiagnosticLog,
    ) -> Option<RegionStats> {
        let stats = self.hour_stats(day, stamp, diagnostics);
        if stats.is_none() {
            info!("Skipping {}: no data for {}", day, stamp);
            diagnostics.day_omitted(day, format!("no data for {}", stamp));
        }
        stats
    }

    /// Reduce the snapshot of one hour, `None` when no usable snapshot exists
    pub fn hour_stats(
        &self,
        day: NaiveDate,
        stamp: HourStamp,
        diagnostics: &mut DiagnosticLog,
    ) -> Option<RegionStats> {
        let snapshot = match self.grid.fetch(stamp) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                diagnostics.input_missing(day, stamp);
                return None;
            }
            Err(e) => {
                diagnostics.input_unreadable(day, stamp, e.to_string());
                return None;
            }
        };

        let regions = self.regions.for_source(snapshot.source());
        let stats = self.reducer.compute_hour_stats(&snapshot, regions);
        diagnostics.region_skips(day, stamp, &stats.skipped);
        Some(stats)
    }
}
