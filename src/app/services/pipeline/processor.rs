//! Pipeline orchestration

use super::stats::{OutputPaths, RunSummary, TownTableSummary};
use crate::Result;
use crate::app::context::RunContext;
use crate::app::models::{OutlierRow, SaleRecord};
use crate::app::services::distance::compute_distances;
use crate::app::services::geocoder::Geocoder;
use crate::app::services::location_analysis::analyze_locations;
use crate::app::services::outlier_filter::filter_outliers;
use crate::app::services::point_parser::parse_original_locations;
use crate::app::services::record_io::{
    RecordTable, read_records, unique_towns, write_enriched, write_outlier_report,
};
use crate::app::services::synthetic_location::build_synthetic_locations;
use crate::app::services::town_registry::{TownCoordinateResolver, TownCoordinateTable};
use crate::config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{Instrument, info, warn};

/// Records, outliers and statistics produced by a run
#[derive(Debug, Clone)]
pub struct GeoCheckResult {
    pub records: Vec<SaleRecord>,
    pub outliers: Vec<OutlierRow>,
    pub summary: RunSummary,
}

/// Geocheck pipeline over one input file and one town table
#[derive(Debug, Clone)]
pub struct GeoCheckPipeline {
    config: Config,
}

impl GeoCheckPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build or refresh the town table for the input's towns, without
    /// touching the records further
    pub async fn build_town_table(
        &self,
        geocoder: Option<&dyn Geocoder>,
        ctx: &RunContext,
    ) -> Result<TownTableSummary> {
        self.build_town_table_stages(geocoder, ctx)
            .instrument(ctx.span().clone())
            .await
    }

    /// Run every stage and write both output files
    ///
    /// `geocoder` is only consulted for towns the table has never seen; pass
    /// `None` (or configure `offline`) to work from the table alone.
    pub async fn run(
        &self,
        geocoder: Option<&dyn Geocoder>,
        ctx: &RunContext,
    ) -> Result<GeoCheckResult> {
        self.run_stages(geocoder, ctx)
            .instrument(ctx.span().clone())
            .await
    }

    async fn build_town_table_stages(
        &self,
        geocoder: Option<&dyn Geocoder>,
        ctx: &RunContext,
    ) -> Result<TownTableSummary> {
        self.config.validate()?;
        let table = self.load_records()?;
        let (_, summary) = self.resolve_towns(&table.records, geocoder, ctx).await?;
        Ok(summary)
    }

    async fn run_stages(
        &self,
        geocoder: Option<&dyn Geocoder>,
        ctx: &RunContext,
    ) -> Result<GeoCheckResult> {
        self.config.validate()?;
        info!("Starting geocheck of {}", self.config.input_path.display());

        let RecordTable {
            headers,
            mut records,
            stats: read,
        } = self.load_records()?;
        let original_points = parse_original_locations(&mut records);

        let (town_table, town_summary) = self.resolve_towns(&records, geocoder, ctx).await?;

        let synthesis = build_synthetic_locations(&mut records, &town_table);
        let distances = compute_distances(&mut records);

        let outlier_config = &self.config.outliers;
        let outliers = filter_outliers(
            &records,
            outlier_config.threshold_km,
            outlier_config.order,
        );
        let analysis = analyze_locations(&records, &outliers, outlier_config.top_locations);

        let outputs = OutputPaths {
            enriched: self.config.enriched_output_path(),
            outlier_report: self.config.outlier_report_path(),
        };
        write_enriched(&outputs.enriched, &headers, &records)?;
        write_outlier_report(&outputs.outlier_report, &outliers)?;

        let summary = RunSummary {
            run_id: ctx.run_id().to_string(),
            started_at: ctx.started_at(),
            input_path: self.config.input_path.clone(),
            read,
            original_points,
            town_table: town_summary,
            synthesis,
            distances,
            threshold_km: outlier_config.threshold_km,
            outliers: outliers.len(),
            analysis,
            outputs,
            elapsed_secs: ctx.elapsed().as_secs_f64(),
        };

        info!("Geocheck complete: {}", summary.summary());

        Ok(GeoCheckResult {
            records,
            outliers,
            summary,
        })
    }

    fn load_records(&self) -> Result<RecordTable> {
        read_records(&self.config.input_path, &self.config.columns)
    }

    /// Bring the town table up to date for `records` and publish it
    async fn resolve_towns(
        &self,
        records: &[SaleRecord],
        geocoder: Option<&dyn Geocoder>,
        ctx: &RunContext,
    ) -> Result<(TownCoordinateTable, TownTableSummary)> {
        let path = &self.config.town_table_path;
        let towns = unique_towns(records);
        let table = TownCoordinateTable::load(path)?;

        let geocoder = match geocoder {
            Some(_) if self.config.offline => None,
            other => other,
        };

        let (table, resolution) = match geocoder {
            Some(geocoder) => {
                let mut resolver = TownCoordinateResolver::new(geocoder, table)
                    .with_concurrency(self.config.geocoder.concurrency);

                if self.config.refresh_unresolved {
                    resolver.refresh_unresolved();
                }

                let pb = ctx
                    .show_progress()
                    .then(|| create_progress_bar(towns.len() as u64, "Geocoding towns"));
                resolver.resolve_all(&towns, pb.as_ref()).await;
                if let Some(pb) = pb {
                    pb.finish_with_message("Town resolution complete");
                }

                let (table, stats) = resolver.into_parts();
                table.save(path)?;
                (table, Some(stats))
            }
            None => {
                let missing = towns.iter().filter(|town| !table.contains(town)).count();
                if missing > 0 {
                    warn!(
                        "Offline run: {} towns are not in the town table and stay unresolved",
                        missing
                    );
                }
                (table, None)
            }
        };

        let summary = TownTableSummary {
            path: path.clone(),
            towns_in_input: towns.len(),
            towns: table.len(),
            resolved: table.resolved_count(),
            unresolved: table.unresolved_count(),
            resolution,
        };

        info!(
            "Town table {}: {} towns ({} resolved, {} unresolved)",
            path.display(),
            summary.towns,
            summary.resolved,
            summary.unresolved
        );

        Ok((table, summary))
    }
}

/// Create a progress bar for a pipeline stage
fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}
