//! Towns command: build or refresh the town coordinate table

use super::shared::{create_geocoder, load_configuration, setup_logging};
use crate::app::context::RunContext;
use crate::app::services::geocoder::Geocoder;
use crate::app::services::pipeline::{GeoCheckPipeline, TownTableSummary};
use crate::cli::args::{OutputFormat, TownsArgs};
use anyhow::{Context, Result};
use colored::*;

/// Run the towns command
pub async fn run_towns(args: TownsArgs) -> Result<()> {
    setup_logging(&args.common);
    args.common.validate()?;

    let config = load_configuration(&args.common)?;
    let geocoder = create_geocoder(&config)?;
    let ctx = RunContext::new(args.common.show_progress());

    let summary = GeoCheckPipeline::new(config)
        .build_town_table(geocoder.as_ref().map(|g| g as &dyn Geocoder), &ctx)
        .await
        .context("Failed to build town table")?;

    match args.common.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Human => print_town_table_summary(&summary),
    }

    Ok(())
}

/// Print a human-readable town table summary
pub fn print_town_table_summary(summary: &TownTableSummary) {
    println!("\n{}", "Town Table".bright_green().bold());
    println!(
        "  {} {}",
        "Table:".bright_cyan(),
        summary.path.display().to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Towns in input:".bright_cyan(),
        summary.towns_in_input.to_string().bright_white().bold()
    );
    println!(
        "  {} {} ({} resolved, {} unresolved)",
        "Towns cached:".bright_cyan(),
        summary.towns.to_string().bright_white().bold(),
        summary.resolved.to_string().bright_green(),
        summary.unresolved.to_string().bright_yellow()
    );

    if let Some(resolution) = &summary.resolution {
        println!(
            "  {} {} ({} from cache)",
            "Lookups:".bright_cyan(),
            resolution.lookups.to_string().bright_white(),
            resolution.cache_hits.to_string().bright_white()
        );
        if resolution.transport_failures > 0 {
            println!(
                "  {} {}",
                "Service failures:".bright_red(),
                resolution.transport_failures.to_string().bright_red().bold()
            );
        }
    }
}
