//! Location coverage and distance distribution analysis
//!
//! Summaries computed over the enriched records after distances are known:
//! how many location fields are populated, whether stated and synthetic
//! coordinates agree, which stated locations recur most often, how the
//! stated and synthetic coordinates are distributed, and the distribution of
//! distances overall and among outliers.

use crate::app::models::{Coordinate, OutlierRow, SaleRecord};
use serde::Serialize;
use std::collections::HashMap;

/// Populated-cell counts for the location columns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NonNullCounts {
    pub location: usize,
    pub longitude: usize,
    pub latitude: usize,
    pub synth_location: usize,
    pub synth_longitude: usize,
    pub synth_latitude: usize,
}

impl NonNullCounts {
    pub fn from_records(records: &[SaleRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.location += usize::from(record.location.is_some());
            counts.synth_location += usize::from(record.synthetic_location.is_some());
            if record.original.is_some() {
                counts.longitude += 1;
                counts.latitude += 1;
            }
            if record.synthetic.is_some() {
                counts.synth_longitude += 1;
                counts.synth_latitude += 1;
            }
        }
        counts
    }
}

/// Agreement between stated and synthetic coordinates
///
/// Only records with a stated location are considered. A record whose
/// synthetic or parsed original coordinate is missing counts as non-matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinateAgreement {
    pub matching: usize,
    pub non_matching: usize,
}

impl CoordinateAgreement {
    pub fn from_records(records: &[SaleRecord]) -> Self {
        let mut agreement = Self::default();
        for record in records.iter().filter(|r| r.location.is_some()) {
            match (record.original, record.synthetic) {
                (Some(original), Some(synthetic)) if original == synthetic => {
                    agreement.matching += 1
                }
                _ => agreement.non_matching += 1,
            }
        }
        agreement
    }
}

/// A stated location and how many records share it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub count: usize,
}

/// Most frequent stated locations, by count then name
pub fn top_locations(records: &[SaleRecord], limit: usize) -> Vec<LocationCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for location in records.iter().filter_map(|r| r.location.as_deref()) {
        *counts.entry(location).or_default() += 1;
    }

    let mut ranked: Vec<LocationCount> = counts
        .into_iter()
        .map(|(location, count)| LocationCount {
            location: location.to_string(),
            count,
        })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.location.cmp(&b.location)));
    ranked.truncate(limit);
    ranked
}

/// Count, mean, sample standard deviation, extremes and quartiles
///
/// Quartiles use linear interpolation between closest ranks. With fewer
/// than two values the standard deviation is undefined and reported as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl DescriptiveStats {
    /// Describe a sample; `None` when it is empty
    pub fn describe(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let squares: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (count - 1) as f64).sqrt()
        });

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.50),
            p75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// All location analysis results for a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationAnalysis {
    pub non_null: NonNullCounts,
    pub agreement: CoordinateAgreement,
    pub top_locations: Vec<LocationCount>,
    pub coordinates: CoordinateDescriptions,
    pub distances: Option<DescriptiveStats>,
    pub outlier_distances: Option<DescriptiveStats>,
}

/// Distributions of the stated and synthetic coordinate columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateDescriptions {
    pub longitude: Option<DescriptiveStats>,
    pub latitude: Option<DescriptiveStats>,
    pub synth_longitude: Option<DescriptiveStats>,
    pub synth_latitude: Option<DescriptiveStats>,
}

impl CoordinateDescriptions {
    pub fn from_records(records: &[SaleRecord]) -> Self {
        let original: Vec<_> = records.iter().filter_map(|r| r.original).collect();
        let synthetic: Vec<_> = records.iter().filter_map(|r| r.synthetic).collect();

        Self {
            longitude: describe_axis(&original, |c| c.longitude),
            latitude: describe_axis(&original, |c| c.latitude),
            synth_longitude: describe_axis(&synthetic, |c| c.longitude),
            synth_latitude: describe_axis(&synthetic, |c| c.latitude),
        }
    }
}

fn describe_axis(
    points: &[Coordinate],
    axis: fn(&Coordinate) -> f64,
) -> Option<DescriptiveStats> {
    let values: Vec<f64> = points.iter().map(axis).collect();
    DescriptiveStats::describe(&values)
}

/// Analyse enriched records and their outliers
pub fn analyze_locations(
    records: &[SaleRecord],
    outliers: &[OutlierRow],
    top_n: usize,
) -> LocationAnalysis {
    let distances: Vec<f64> = records.iter().filter_map(|r| r.distance_km).collect();
    let outlier_distances: Vec<f64> = outliers.iter().map(|o| o.distance_km).collect();

    LocationAnalysis {
        non_null: NonNullCounts::from_records(records),
        agreement: CoordinateAgreement::from_records(records),
        top_locations: top_locations(records, top_n),
        coordinates: CoordinateDescriptions::from_records(records),
        distances: DescriptiveStats::describe(&distances),
        outlier_distances: DescriptiveStats::describe(&outlier_distances),
    }
}
