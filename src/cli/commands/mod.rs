//! Command implementations for the sales-geocheck CLI
//!
//! Each command lives in its own module:
//! - `towns`: build or refresh the town coordinate table
//! - `run`: full geocheck with enriched output and outlier report

pub mod run;
pub mod shared;
pub mod towns;

use crate::cli::args::{Args, Commands};
use anyhow::Result;

/// Dispatch to the subcommand handler
///
/// `main` shows help when no subcommand is given, so `command` is always set here.
pub async fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Commands::Towns(towns_args)) => towns::run_towns(towns_args).await,
        Some(Commands::Run(run_args)) => run::run_geocheck(run_args).await,
        None => anyhow::bail!("No command given; see --help"),
    }
}
