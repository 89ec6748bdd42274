//! Command implementations for the rainfall indicator CLI
//!
//! Each command is implemented in its own module:
//! - `compute`: daily series over a date range (default)
//! - `realtime`: the last few days up to today
//! - `inventory`: tile availability report

pub mod compute;
pub mod inventory;
pub mod realtime;
pub mod shared;

use crate::cli::args::{Args, Commands};
use crate::error::Result;

/// Main command runner
///
/// Logging is set up from the selected command's verbosity flags before
/// dispatching.
pub fn run(args: Args) -> Result<()> {
    let command = args.get_command();
    shared::setup_logging(command.verbosity())?;

    match command {
        Commands::Compute(compute_args) => compute::run_compute(compute_args).map(|_| ()),
        Commands::Realtime(realtime_args) => realtime::run_realtime(realtime_args).map(|_| ()),
        Commands::Inventory(inventory_args) => inventory::run_inventory(inventory_args),
    }
}
