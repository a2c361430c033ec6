//! Shared components for CLI commands
//!
//! Logging setup, layered configuration loading and geocoder construction
//! used by every command.

use crate::app::services::geocoder::NominatimGeocoder;
use crate::cli::args::CommonArgs;
use crate::config::Config;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Set up structured logging on stderr
pub fn setup_logging(args: &CommonArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sales_geocheck={}", log_level)));

    if args.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Load configuration using the layered approach (defaults -> file -> args)
pub fn load_configuration(args: &CommonArgs) -> Result<Config> {
    let default_config_path = if args.config_file.is_none() {
        Config::default_config_path().ok()
    } else {
        None
    };

    let config_file = match &args.config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_deref()
            .filter(|path| path.exists()),
    };

    match config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let mut config = Config::load(config_file).context("Failed to load configuration")?;
    apply_common_overrides(&mut config, args);

    Ok(config)
}

/// Apply shared CLI argument overrides to configuration
pub fn apply_common_overrides(config: &mut Config, args: &CommonArgs) {
    if let Some(input_path) = &args.input_path {
        config.input_path = input_path.clone();
    }
    if let Some(town_table_path) = &args.town_table_path {
        config.town_table_path = town_table_path.clone();
    }
    if let Some(url) = &args.geocoder_url {
        config.geocoder.base_url = url.clone();
    }
    if let Some(region) = &args.region {
        config.geocoder.region = region.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.geocoder.concurrency = concurrency;
    }
    if args.refresh_unresolved {
        config.refresh_unresolved = true;
    }
}

/// Build the geocoder for an online run; `None` when offline
pub fn create_geocoder(config: &Config) -> Result<Option<NominatimGeocoder>> {
    if config.offline {
        info!("Offline mode: the geocoder will not be called");
        return Ok(None);
    }

    let geocoder =
        NominatimGeocoder::new(&config.geocoder).context("Failed to create geocoding client")?;
    info!(
        "Geocoding via {} (region '{}')",
        config.geocoder.base_url,
        geocoder.region()
    );
    Ok(Some(geocoder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Args, Commands};
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn common(argv: &[&str]) -> CommonArgs {
        match Args::try_parse_from(argv).unwrap().command {
            Some(Commands::Towns(args)) => args.common,
            Some(Commands::Run(args)) => args.common,
            None => panic!("expected a command"),
        }
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
town_table_path = "from_file.json"

[geocoder]
region = "Rhode Island"
concurrency = 2
"#
        )
        .unwrap();

        let config_path = file.path().to_str().unwrap();
        let args = common(&[
            "sales-geocheck",
            "towns",
            "--config",
            config_path,
            "--town-table",
            "from_cli.json",
            "--concurrency",
            "4",
        ]);

        let config = load_configuration(&args).unwrap();
        assert_eq!(config.town_table_path, PathBuf::from("from_cli.json"));
        assert_eq!(config.geocoder.region, "Rhode Island");
        assert_eq!(config.geocoder.concurrency, 4);
        assert!(!config.refresh_unresolved);
    }

    #[test]
    fn test_offline_config_builds_no_geocoder() {
        let config = Config::default().with_offline();
        assert!(create_geocoder(&config).unwrap().is_none());

        let online = create_geocoder(&Config::default()).unwrap();
        assert_eq!(online.unwrap().region(), "Connecticut");
    }
}
