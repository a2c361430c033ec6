//! Great-circle distance between stated and synthetic locations
//!
//! Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
//! The `asin(sqrt(a))` form is used rather than `atan2` so results match
//! other implementations of the same comparison to within 1e-6 relative.

use crate::app::models::{Coordinate, SaleRecord};
use crate::constants::EARTH_RADIUS_KM;
use serde::Serialize;
use tracing::{debug, info};

/// Haversine distance in kilometres between two points given in degrees
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1, lon2, lat2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );

    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Haversine distance between two parsed coordinates
pub fn distance_between(from: &Coordinate, to: &Coordinate) -> f64 {
    haversine_km(from.longitude, from.latitude, to.longitude, to.latitude)
}

/// Outcome of a batch distance computation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistanceSummary {
    /// Records that received a distance
    pub computed: usize,
    /// Records missing one or more of the four coordinates
    pub incomplete: usize,
    /// Of the incomplete records, those without original coordinates
    pub missing_original: usize,
    /// Of the incomplete records, those without synthetic coordinates
    pub missing_synthetic: usize,
}

impl DistanceSummary {
    pub fn total(&self) -> usize {
        self.computed + self.incomplete
    }
}

/// Compute distances for every fully coordinated record
///
/// Incomplete records keep `distance_km = None`; no sentinel values are
/// written. A record missing both sides counts towards both `missing_*`
/// fields but only once towards `incomplete`.
pub fn compute_distances(records: &mut [SaleRecord]) -> DistanceSummary {
    let mut summary = DistanceSummary::default();

    for record in records.iter_mut() {
        match (&record.original, &record.synthetic) {
            (Some(original), Some(synthetic)) => {
                record.distance_km = Some(distance_between(original, synthetic));
                summary.computed += 1;
            }
            (original, synthetic) => {
                record.distance_km = None;
                summary.incomplete += 1;
                if original.is_none() {
                    summary.missing_original += 1;
                }
                if synthetic.is_none() {
                    summary.missing_synthetic += 1;
                }
                debug!(
                    "Record {} has insufficient coordinates for a distance",
                    record.serial_number
                );
            }
        }
    }

    info!(
        "Distance computation: {} of {} records had insufficient data",
        summary.incomplete,
        summary.total()
    );

    summary
}
