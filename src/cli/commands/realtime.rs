//! Realtime command: recompute the last days up to today
//!
//! Meant for scheduled runs. Recent days are recomputed on every run since
//! their end-of-day tiles may arrive late; today itself is omitted until
//! tomorrow's 06:00 tile exists.

use crate::app::services::series::RunSummary;
use crate::cli::args::RealtimeArgs;
use crate::cli::commands::shared::{load_configuration, run_series};
use crate::error::Result;
use chrono::{Days, Local, NaiveDate};
use tracing::info;

/// `[today - days, today]`
pub fn realtime_range(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

pub fn run_realtime(args: RealtimeArgs) -> Result<RunSummary> {
    let (start, end) = realtime_range(Local::now().date_naive(), args.days);
    info!("Realtime run from {} to {}", start, end);

    let config = load_configuration(&args.options)?;
    run_series(&config, start, end, &args.verbosity)
}
