//! Range command: compute the series between two dates

use crate::app::services::series::RunSummary;
use crate::cli::args::ComputeArgs;
use crate::cli::commands::shared::{load_configuration, run_series};
use crate::error::Result;
use tracing::info;

/// Compute every day of the requested range
pub fn run_compute(args: ComputeArgs) -> Result<RunSummary> {
    let (start, end) = args.date_range()?;
    info!("Computing rainfall indicator from {} to {}", start, end);

    let config = load_configuration(&args.options)?;
    run_series(&config, start, end, &args.verbosity)
}
