//! Command-line argument definitions for sales-geocheck
//!
//! This module defines the CLI interface using the clap derive API. Every
//! option here overrides the matching configuration file setting.

use crate::app::services::outlier_filter::OutlierOrder;
use crate::constants::MAX_GEOCODER_CONCURRENCY;
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the sales geocheck tool
///
/// Compares the coordinates stated on real-estate sale records against
/// geocoded town centroids and reports sales whose stated location is far
/// from the town they were recorded in.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sales-geocheck",
    version,
    about = "Flag real-estate sales whose stated location is far from their town",
    long_about = "Reads sale records with POINT (<lon> <lat>) locations, resolves each town to \
                  a centroid through a Nominatim-compatible geocoder (cached in a JSON town \
                  table), computes the great-circle distance between stated and town locations \
                  and writes an enriched record file plus a ranked outlier report."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Build or refresh the town coordinate table only
    Towns(TownsArgs),
    /// Run the full geocheck and write the enriched records and outlier report
    Run(RunArgs),
}

/// Options shared by every subcommand
#[derive(Debug, Clone, ClapArgs)]
pub struct CommonArgs {
    /// Input CSV of sale records
    #[arg(
        short = 'i',
        long = "input",
        value_name = "CSV",
        help = "Input CSV of sale records"
    )]
    pub input_path: Option<PathBuf>,

    /// Town coordinate table (JSON), created if missing
    #[arg(
        short = 't',
        long = "town-table",
        value_name = "JSON",
        help = "Town coordinate table, created if missing"
    )]
    pub town_table_path: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// TOML configuration file for column names and geocoder settings. If not
    /// specified, looks for <config dir>/sales-geocheck/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Base URL of a Nominatim-compatible geocoding service
    #[arg(long = "geocoder-url", value_name = "URL")]
    pub geocoder_url: Option<String>,

    /// Region qualifier appended to every town query
    #[arg(long = "region", value_name = "NAME")]
    pub region: Option<String>,

    /// Concurrent geocoding lookups
    #[arg(short = 'j', long = "concurrency", value_name = "COUNT")]
    pub concurrency: Option<usize>,

    /// Look up towns cached as unresolved again
    #[arg(long = "refresh-unresolved")]
    pub refresh_unresolved: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings and hides progress bars.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for the run summary
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the towns command
#[derive(Debug, Clone, Parser)]
pub struct TownsArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the run command
#[derive(Debug, Clone, Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Directory for the enriched records and outlier report
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        help = "Directory for the enriched records and outlier report"
    )]
    pub output_dir: Option<PathBuf>,

    /// Distances strictly greater than this many kilometres are outliers
    #[arg(long = "threshold", value_name = "KM")]
    pub threshold_km: Option<f64>,

    /// Outlier report ordering
    #[arg(long = "order", value_enum)]
    pub order: Option<OutlierOrder>,

    /// Never call the geocoder; towns missing from the table stay unresolved
    #[arg(long = "offline")]
    pub offline: bool,
}

/// Output format options for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl CommonArgs {
    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(input_path) = &self.input_path {
            if !input_path.is_file() {
                return Err(Error::file_not_found(input_path.display().to_string()));
            }
        }

        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 || concurrency > MAX_GEOCODER_CONCURRENCY {
                return Err(Error::configuration(format!(
                    "Concurrency must be between 1 and {}",
                    MAX_GEOCODER_CONCURRENCY
                )));
            }
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
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

    /// Check if we should show progress bars (not in quiet or JSON mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}

impl RunArgs {
    /// Validate the run command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;

        if let Some(threshold) = self.threshold_km {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(Error::configuration(format!(
                    "Threshold must be a non-negative number of kilometres, got {}",
                    threshold
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    fn run_args(argv: &[&str]) -> RunArgs {
        match parse(argv).command {
            Some(Commands::Run(args)) => args,
            other => panic!("expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_run_command_parsing() {
        let args = run_args(&[
            "sales-geocheck",
            "run",
            "--input",
            "sales.csv",
            "--town-table",
            "towns.json",
            "--output-dir",
            "out",
            "--threshold",
            "25",
            "--order",
            "input",
            "--offline",
            "-vv",
        ]);

        assert_eq!(args.common.input_path, Some(PathBuf::from("sales.csv")));
        assert_eq!(args.common.town_table_path, Some(PathBuf::from("towns.json")));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.threshold_km, Some(25.0));
        assert_eq!(args.order, Some(OutlierOrder::Input));
        assert!(args.offline);
        assert_eq!(args.common.verbose, 2);
    }

    #[test]
    fn test_order_accepts_distance() {
        let args = run_args(&["sales-geocheck", "run", "--order", "distance"]);
        assert_eq!(args.order, Some(OutlierOrder::DistanceDescending));
    }

    #[test]
    fn test_towns_command_parsing() {
        let args = parse(&[
            "sales-geocheck",
            "towns",
            "-i",
            "sales.csv",
            "--refresh-unresolved",
            "--output-format",
            "json",
        ]);

        match args.command {
            Some(Commands::Towns(towns)) => {
                assert!(towns.common.refresh_unresolved);
                assert_eq!(towns.common.output_format, OutputFormat::Json);
                assert!(!towns.common.show_progress());
            }
            other => panic!("expected towns command, got {:?}", other),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["sales-geocheck", "run", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = run_args(&["sales-geocheck", "run"]);
        assert_eq!(args.common.get_log_level(), "warn");

        args.common.verbose = 1;
        assert_eq!(args.common.get_log_level(), "info");
        args.common.verbose = 3;
        assert_eq!(args.common.get_log_level(), "trace");

        args.common.quiet = true;
        assert_eq!(args.common.get_log_level(), "error");
        assert!(!args.common.show_progress());
    }

    #[test]
    fn test_validation() {
        let input = NamedTempFile::new().unwrap();
        let input_path = input.path().to_str().unwrap();

        let ok = run_args(&["sales-geocheck", "run", "-i", input_path, "--threshold", "0"]);
        assert!(ok.validate().is_ok());

        let missing_input = run_args(&["sales-geocheck", "run", "-i", "/no/such/file.csv"]);
        assert!(missing_input.validate().is_err());

        let negative = run_args(&["sales-geocheck", "run", "--threshold=-1"]);
        assert!(negative.validate().is_err());

        let zero_workers = run_args(&["sales-geocheck", "run", "-j", "0"]);
        assert!(zero_workers.validate().is_err());
    }
}
