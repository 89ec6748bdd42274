//! Command-line argument definitions for the rainfall indicator
//!
//! The default invocation `rainfall-indicator <START> <END>` computes the
//! daily series over an inclusive date range; subcommands cover the
//! scheduled realtime run and the tile inventory.

use crate::config::OutputFormat;
use crate::constants::DEFAULT_REALTIME_DAYS;
use crate::error::{IndicatorError, Result};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the rainfall indicator
///
/// Computes a daily rainfall accumulation per administrative region from
/// hourly yearly-cumulative rainfall rasters.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rainfall-indicator",
    version,
    about = "Daily rainfall accumulation per administrative region from hourly cumulative rasters",
    long_about = "Computes, for each day of a range, the 24-hour rainfall accumulation \
                  (06:00 UTC to 06:00 UTC) averaged over each administrative region, plus a \
                  national mean. Rows are written as CSV to standard output or to a file, \
                  or as a Parquet file.",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub compute: ComputeArgs,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Compute the series over a date range (default command)
    Compute(ComputeArgs),
    /// Compute the last few days up to today, for scheduled runs
    Realtime(RealtimeArgs),
    /// Report which tiles are available for each day of a range
    Inventory(InventoryArgs),
}

/// Logging verbosity flags shared by every command
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct Verbosity {
    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Verbosity {
    /// Determine the log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars and summaries are hidden in quiet mode
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Settings shared by the commands that compute the series
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct RunOptions {
    /// TOML configuration file. Defaults to
    /// `<config_dir>/rainfall-indicator/config.toml` when present.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Tiles directory holding `YYYY/MM/DD/` sub-directories
    #[arg(long = "tiles-dir", value_name = "PATH", help = "Tiles directory")]
    pub tiles_dir: Option<PathBuf>,

    /// Directory holding the region catalog files
    #[arg(
        long = "regions-dir",
        value_name = "PATH",
        help = "Region catalog directory"
    )]
    pub regions_dir: Option<PathBuf>,

    /// Raw values above this are treated as no-data
    #[arg(
        long = "nodata-threshold",
        value_name = "VALUE",
        help = "Raw values above this are treated as no-data"
    )]
    pub nodata_threshold: Option<f64>,

    #[arg(long = "format", value_enum, help = "Output format")]
    pub format: Option<OutputFormat>,

    /// Output file. CSV goes to standard output when absent.
    #[arg(short = 'o', long = "output", value_name = "FILE", help = "Output file")]
    pub output: Option<PathBuf>,
}

/// Arguments for computing a date range
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct ComputeArgs {
    /// First day (YYYY-MM-DD)
    #[arg(value_name = "START", required = true)]
    pub start: Option<NaiveDate>,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(value_name = "END", required = true)]
    pub end: Option<NaiveDate>,

    #[command(flatten)]
    pub options: RunOptions,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

impl ComputeArgs {
    /// Validated `(start, end)` pair
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(IndicatorError::configuration(
                "Both START and END dates are required",
            ));
        };
        if start > end {
            return Err(IndicatorError::InvalidDateRange { start, end });
        }
        Ok((start, end))
    }
}

/// Arguments for the realtime command
#[derive(Debug, Clone, ClapArgs)]
pub struct RealtimeArgs {
    /// Number of days before today to recompute
    #[arg(
        long = "days",
        value_name = "N",
        default_value_t = DEFAULT_REALTIME_DAYS,
        help = "Number of days before today to recompute"
    )]
    pub days: u32,

    #[command(flatten)]
    pub options: RunOptions,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

/// Arguments for the inventory command
#[derive(Debug, Clone, ClapArgs)]
pub struct InventoryArgs {
    /// First day (YYYY-MM-DD)
    #[arg(value_name = "START")]
    pub start: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(value_name = "END")]
    pub end: NaiveDate,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(long = "tiles-dir", value_name = "PATH", help = "Tiles directory")]
    pub tiles_dir: Option<PathBuf>,

    #[arg(long = "json", help = "Print the report as JSON")]
    pub json: bool,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

impl Args {
    /// The command to run, defaulting to a range computation
    pub fn get_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Compute(self.compute.clone()))
    }
}

impl Commands {
    pub fn verbosity(&self) -> &Verbosity {
        match self {
            Commands::Compute(args) => &args.verbosity,
            Commands::Realtime(args) => &args.verbosity,
            Commands::Inventory(args) => &args.verbosity,
        }
    }
}
