use clap::Parser;
use sales_geocheck::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    eprintln!("Failed to listen for CTRL+C: {}", e);
                }
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(sales_geocheck::Error::processing_interrupted(
                    "Processing interrupted by user",
                )
                .into())
            }
        }
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Sales Geocheck - Sale Location Consistency Checker");
    println!("==================================================");
    println!();
    println!("Compare the coordinates stated on real-estate sale records with");
    println!("geocoded town centroids and report sales that are far from their town.");
    println!();
    println!("USAGE:");
    println!("    sales-geocheck <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    towns       Build or refresh the town coordinate table");
    println!("    run         Run the full geocheck and write reports");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Resolve every town in the input once and cache the results:");
    println!("    sales-geocheck towns --input sales.csv --town-table towns.json");
    println!();
    println!("    # Run the geocheck with a 25 km threshold, using only cached towns:");
    println!("    sales-geocheck run --input sales.csv --town-table towns.json \\");
    println!("                       --threshold 25 --offline");
    println!();
    println!("For detailed help on any command, use:");
    println!("    sales-geocheck <COMMAND> --help");
}
