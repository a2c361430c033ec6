//! Distance outlier selection
//!
//! A record is an outlier when the distance between its stated location and
//! its town centroid is strictly greater than the configured threshold.

use crate::app::models::{OutlierRow, SaleRecord};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Ordering of the outlier report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutlierOrder {
    /// Largest distance first; ties keep input order
    #[default]
    #[value(name = "distance")]
    #[serde(rename = "distance")]
    DistanceDescending,
    /// Same order as the input records
    Input,
}

/// Select records whose distance exceeds `threshold_km`
///
/// Records without a distance never qualify.
pub fn filter_outliers(
    records: &[SaleRecord],
    threshold_km: f64,
    order: OutlierOrder,
) -> Vec<OutlierRow> {
    let mut outliers: Vec<OutlierRow> = records
        .iter()
        .filter_map(|record| {
            let distance_km = record.distance_km?;
            (distance_km > threshold_km).then(|| OutlierRow {
                serial_number: record.serial_number.clone(),
                town: record.town.clone(),
                distance_km,
            })
        })
        .collect();

    if order == OutlierOrder::DistanceDescending {
        // sort_by is stable, so equal distances stay in input order
        outliers.sort_by(|a, b| b.distance_km.total_cmp(&a.distance_km));
    }

    info!(
        "Outlier filtering: {} records beyond {} km",
        outliers.len(),
        threshold_km
    );

    outliers
}
