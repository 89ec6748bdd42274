use anyhow::Context;
use clap::Parser;
use rainfall_indicator::cli::{args::Args, commands};
use std::process;

fn main() {
    // Usage errors exit with status 2 through clap
    let args = Args::parse();

    match commands::run(args).context("rainfall indicator run failed") {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
