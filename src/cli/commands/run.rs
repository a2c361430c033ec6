//! Run command: full geocheck with enriched output and outlier report

use super::shared::{create_geocoder, load_configuration, setup_logging};
use super::towns::print_town_table_summary;
use crate::app::context::RunContext;
use crate::app::services::geocoder::Geocoder;
use crate::app::services::location_analysis::DescriptiveStats;
use crate::app::services::pipeline::{GeoCheckPipeline, GeoCheckResult};
use crate::cli::args::{OutputFormat, RunArgs};
use crate::config::Config;
use anyhow::{Context, Result};
use colored::*;

/// Run the geocheck command
pub async fn run_geocheck(args: RunArgs) -> Result<()> {
    setup_logging(&args.common);
    args.validate()?;

    let mut config = load_configuration(&args.common)?;
    apply_run_overrides(&mut config, &args);

    let geocoder = create_geocoder(&config)?;
    let ctx = RunContext::new(args.common.show_progress());

    if args.common.output_format == OutputFormat::Human {
        println!("{}", "Starting sales geocheck".bright_green().bold());
        println!(
            "  {} {}",
            "Input:".bright_cyan(),
            config.input_path.display()
        );
        println!(
            "  {} {}",
            "Output:".bright_cyan(),
            config.output_dir.display()
        );
    }

    let result = GeoCheckPipeline::new(config)
        .run(geocoder.as_ref().map(|g| g as &dyn Geocoder), &ctx)
        .await
        .context("Geocheck failed")?;

    match args.common.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result.summary)?);
        }
        OutputFormat::Human => print_run_summary(&result),
    }

    Ok(())
}

/// Apply run-specific CLI argument overrides to configuration
pub fn apply_run_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(threshold_km) = args.threshold_km {
        config.outliers.threshold_km = threshold_km;
    }
    if let Some(order) = args.order {
        config.outliers.order = order;
    }
    if args.offline {
        config.offline = true;
    }
}

fn format_stats(stats: &DescriptiveStats) -> String {
    format!(
        "n={} mean={:.2} std={} min={:.2} median={:.2} max={:.2}",
        stats.count,
        stats.mean,
        stats
            .std
            .map(|std| format!("{:.2}", std))
            .unwrap_or_else(|| "-".to_string()),
        stats.min,
        stats.p50,
        stats.max
    )
}

/// Print a human-readable run summary
fn print_run_summary(result: &GeoCheckResult) {
    let summary = &result.summary;

    print_town_table_summary(&summary.town_table);

    println!("\n{}", "Geocheck Summary".bright_green().bold());
    println!(
        "  {} {:.2}s",
        "Time elapsed:".bright_cyan(),
        summary.elapsed_secs
    );
    println!(
        "  {} {}",
        "Records read:".bright_cyan(),
        summary.read.records.to_string().bright_white().bold()
    );
    if summary.read.skipped_rows > 0 {
        println!(
            "  {} {}",
            "Rows skipped:".bright_red(),
            summary.read.skipped_rows.to_string().bright_red().bold()
        );
    }
    if summary.original_points.malformed > 0 {
        println!(
            "  {} {}",
            "Malformed locations:".bright_yellow(),
            summary.original_points.malformed.to_string().bright_yellow()
        );
    }
    println!(
        "  {} {} ({:.1}%)",
        "Distances computed:".bright_cyan(),
        summary.distances.computed.to_string().bright_white().bold(),
        summary.distance_coverage()
    );
    println!(
        "  {} {} of {} records",
        "Insufficient data:".bright_cyan(),
        summary.distances.incomplete.to_string().bright_white(),
        summary.distances.total()
    );
    println!(
        "  {} {} beyond {} km",
        "Outliers:".bright_cyan(),
        summary.outliers.to_string().bright_white().bold(),
        summary.threshold_km
    );

    let analysis = &summary.analysis;
    println!(
        "  {} {} matching, {} non-matching",
        "Stated vs town:".bright_cyan(),
        analysis.agreement.matching.to_string().bright_white(),
        analysis.agreement.non_matching.to_string().bright_white()
    );
    let coordinate_columns = [
        ("Longitude:", &analysis.coordinates.longitude),
        ("Latitude:", &analysis.coordinates.latitude),
        ("Synth longitude:", &analysis.coordinates.synth_longitude),
        ("Synth latitude:", &analysis.coordinates.synth_latitude),
    ];
    for (label, stats) in coordinate_columns {
        if let Some(stats) = stats {
            println!("  {} {}", label.bright_cyan(), format_stats(stats));
        }
    }
    if let Some(stats) = &analysis.distances {
        println!("  {} {}", "Distances (km):".bright_cyan(), format_stats(stats));
    }
    if let Some(stats) = &analysis.outlier_distances {
        println!("  {} {}", "Outliers (km):".bright_cyan(), format_stats(stats));
    }

    if !analysis.top_locations.is_empty() {
        println!("\n{}", "Most Frequent Locations".bright_green().bold());
        for location in &analysis.top_locations {
            println!(
                "  {:>6}  {}",
                location.count.to_string().bright_white(),
                location.location
            );
        }
    }

    if !result.outliers.is_empty() {
        println!("\n{}", "Largest Distances".bright_green().bold());
        for outlier in result.outliers.iter().take(10) {
            println!(
                "  {:<16} {:<24} {:>10.2} km",
                outlier.serial_number, outlier.town, outlier.distance_km
            );
        }
    }

    println!("\n{}", "Outputs".bright_green().bold());
    println!(
        "  {} {}",
        "Enriched records:".bright_cyan(),
        summary.outputs.enriched.display()
    );
    println!(
        "  {} {}",
        "Outlier report:".bright_cyan(),
        summary.outputs.outlier_report.display()
    );
}
