//! Tests for full pipeline runs

use super::*;
use crate::Error;
use crate::app::context::RunContext;
use crate::app::models::Coordinate;
use crate::app::services::outlier_filter::OutlierOrder;
use crate::app::services::pipeline::GeoCheckPipeline;
use crate::app::services::town_registry::{TownCoordinateTable, TownLookup};
use std::sync::Arc;

#[tokio::test]
async fn test_run_flags_distant_sale() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV);
    let geocoder = hartford_geocoder();

    let result = GeoCheckPipeline::new(config)
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();

    assert_eq!(result.outliers.len(), 1);
    let outlier = &result.outliers[0];
    assert_eq!(outlier.serial_number, "200002");
    assert_eq!(outlier.town, "Hartford");
    assert!(outlier.distance_km > 50.0 && outlier.distance_km < 150.0);

    let in_town = &result.records[0];
    assert_eq!(in_town.distance_km, Some(0.0));
    assert_eq!(in_town.synthetic, Some(Coordinate::new(-72.68, 41.76)));
}

#[tokio::test]
async fn test_run_counts_insufficient_data() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV);
    let geocoder = hartford_geocoder();

    let result = GeoCheckPipeline::new(config)
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();
    let summary = &result.summary;

    assert_eq!(summary.read.records, 4);
    assert_eq!(summary.distances.computed, 2);
    assert_eq!(summary.distances.incomplete, 2);
    assert_eq!(summary.distances.missing_original, 1);
    assert_eq!(summary.distances.missing_synthetic, 1);
    assert_eq!(summary.synthesis.unresolved_towns, 1);
    assert_eq!(summary.original_points.absent, 1);
    assert_eq!(summary.outliers, 1);
    assert_eq!(summary.distance_coverage(), 50.0);
    assert!(summary.summary().contains("2 had insufficient data"));

    // Records are never dropped
    assert_eq!(result.records.len(), 4);
    assert!(result.records[2].synthetic_location.is_some());
    assert_eq!(result.records[2].distance_km, None);
}

#[tokio::test]
async fn test_run_writes_outputs_and_table() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV);
    let geocoder = hartford_geocoder();

    let result = GeoCheckPipeline::new(config.clone())
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();

    let enriched = fs::read_to_string(config.enriched_output_path()).unwrap();
    let mut lines = enriched.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Serial Number,List Year,Town,Sale Amount,Location,Longitude,Latitude,Synth_Location,Synth_Longitude,Synth_Latitude,Distance"
    );
    assert_eq!(enriched.lines().count(), 5);

    let report = fs::read_to_string(config.outlier_report_path()).unwrap();
    assert!(report.starts_with("Serial Number,Town,Distance\n200002,Hartford,"));

    let table = TownCoordinateTable::load(&config.town_table_path).unwrap();
    assert!(matches!(table.lookup("Hartford"), TownLookup::Resolved(_)));
    assert_eq!(table.lookup("Atlantis"), TownLookup::Unresolved);

    assert_eq!(result.summary.outputs.enriched, config.enriched_output_path());
}

#[tokio::test]
async fn test_second_run_uses_cached_table() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV);
    let geocoder = Arc::new(hartford_geocoder());
    let pipeline = GeoCheckPipeline::new(config);

    pipeline
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();
    assert_eq!(geocoder.calls(), 2);

    let second = pipeline
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();

    assert_eq!(geocoder.calls(), 2);
    let resolution = second.summary.town_table.resolution.unwrap();
    assert_eq!(resolution.cache_hits, 2);
    assert_eq!(resolution.lookups, 0);
}

#[tokio::test]
async fn test_refresh_unresolved_retries_cached_misses() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV);
    let geocoder = Arc::new(hartford_geocoder());

    GeoCheckPipeline::new(config.clone())
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();

    GeoCheckPipeline::new(config.with_refresh_unresolved())
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();

    assert_eq!(geocoder.calls_for("Atlantis"), 2);
    assert_eq!(geocoder.calls_for("Hartford"), 1);
}

#[tokio::test]
async fn test_offline_run_uses_existing_table_only() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV).with_offline();

    let mut table = TownCoordinateTable::new();
    table.insert("Hartford", Some(crate::TownCoordinates::new(41.76, -72.68)));
    table.save(&config.town_table_path).unwrap();

    let geocoder = hartford_geocoder();
    let result = GeoCheckPipeline::new(config)
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();

    assert_eq!(geocoder.calls(), 0);
    assert_eq!(result.summary.town_table.resolution, None);
    assert_eq!(result.summary.synthesis.unmatched_towns, 1);
    assert_eq!(result.outliers.len(), 1);
}

#[tokio::test]
async fn test_offline_run_accepts_null_pair_table_entries() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV).with_offline();
    std::fs::write(
        &config.town_table_path,
        r#"{"Hartford": ["41.76", "-72.68"], "Atlantis": [null, null]}"#,
    )
    .unwrap();

    let result = GeoCheckPipeline::new(config)
        .run(None, &RunContext::quiet())
        .await
        .unwrap();

    assert_eq!(result.summary.town_table.towns, 2);
    assert_eq!(result.summary.town_table.unresolved, 1);
    assert_eq!(result.summary.synthesis.unmatched_towns, 0);
    assert_eq!(result.outliers.len(), 1);
}

#[tokio::test]
async fn test_run_without_geocoder_or_table() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV);

    let result = GeoCheckPipeline::new(config)
        .run(None, &RunContext::quiet())
        .await
        .unwrap();

    assert!(result.outliers.is_empty());
    assert_eq!(result.summary.distances.computed, 0);
    assert_eq!(result.summary.synthesis.unmatched_towns, 4);
}

#[tokio::test]
async fn test_input_order_and_threshold() {
    let dir = TempDir::new().unwrap();
    let csv = "\
Serial Number,Town,Location
1,Hartford,POINT (-73.0 41.76)
2,Hartford,POINT (-74.5 41.76)
3,Hartford,POINT (-72.69 41.76)
";
    let geocoder = hartford_geocoder();

    let ranked = GeoCheckPipeline::new(config_in(&dir, csv).with_threshold_km(10.0))
        .run(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();
    let serials: Vec<_> = ranked.outliers.iter().map(|o| o.serial_number.as_str()).collect();
    assert_eq!(serials, vec!["2", "1"]);

    let in_order = GeoCheckPipeline::new(
        config_in(&dir, csv)
            .with_threshold_km(10.0)
            .with_order(OutlierOrder::Input),
    )
    .run(Some(&geocoder), &RunContext::quiet())
    .await
    .unwrap();
    let serials: Vec<_> = in_order.outliers.iter().map(|o| o.serial_number.as_str()).collect();
    assert_eq!(serials, vec!["1", "2"]);
}

#[tokio::test]
async fn test_build_town_table_only() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV);
    let geocoder = hartford_geocoder();

    let summary = GeoCheckPipeline::new(config.clone())
        .build_town_table(Some(&geocoder), &RunContext::quiet())
        .await
        .unwrap();

    assert_eq!(summary.towns_in_input, 2);
    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.unresolved, 1);
    assert!(config.town_table_path.exists());
    assert!(!config.enriched_output_path().exists());
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_reading() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, SALES_CSV).with_threshold_km(-5.0);

    let err = GeoCheckPipeline::new(config)
        .run(None, &RunContext::quiet())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}
