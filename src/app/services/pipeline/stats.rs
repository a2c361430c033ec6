//! Run summaries aggregated from the per-stage statistics

use crate::app::services::distance::DistanceSummary;
use crate::app::services::location_analysis::LocationAnalysis;
use crate::app::services::point_parser::PointParseStats;
use crate::app::services::record_io::ReadStats;
use crate::app::services::synthetic_location::SynthesisStats;
use crate::app::services::town_registry::ResolutionStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// State of the town table after the resolution stage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TownTableSummary {
    pub path: PathBuf,
    /// Distinct towns named by the input records
    pub towns_in_input: usize,
    /// Towns in the table, resolved or not
    pub towns: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Lookup statistics; `None` when the run was offline
    pub resolution: Option<ResolutionStats>,
}

/// Files written by a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputPaths {
    pub enriched: PathBuf,
    pub outlier_report: PathBuf,
}

/// Everything a run did, stage by stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub input_path: PathBuf,
    pub read: ReadStats,
    pub original_points: PointParseStats,
    pub town_table: TownTableSummary,
    pub synthesis: SynthesisStats,
    pub distances: DistanceSummary,
    pub threshold_km: f64,
    pub outliers: usize,
    pub analysis: LocationAnalysis,
    pub outputs: OutputPaths,
    pub elapsed_secs: f64,
}

impl RunSummary {
    /// Percentage of records that received a distance
    pub fn distance_coverage(&self) -> f64 {
        let total = self.distances.total();
        if total == 0 {
            0.0
        } else {
            (self.distances.computed as f64 / total as f64) * 100.0
        }
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} records: {} with distances, {} had insufficient data, {} outliers beyond {} km",
            self.read.records,
            self.distances.computed,
            self.distances.incomplete,
            self.outliers,
            self.threshold_km
        )
    }
}
