//! Synthetic town-level locations
//!
//! Every record whose town has coordinates in the table gets a point string
//! built from them, which is then parsed back with the same lenient parser
//! used for stated locations. The table is only read here.

use crate::app::models::SaleRecord;
use crate::app::services::point_parser::{PointParseStats, format_point, parse_point};
use crate::app::services::town_registry::{TownCoordinateTable, TownLookup};
use serde::Serialize;
use tracing::{debug, info};

/// Counters for the synthesis stage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SynthesisStats {
    /// Records that received a synthetic point string
    pub built: usize,
    /// Records whose town is not in the table
    pub unmatched_towns: usize,
    /// Records whose town is cached as unresolved
    pub unresolved_towns: usize,
    /// Records with no town name
    pub empty_towns: usize,
    /// Parse outcomes for the synthetic point strings
    pub parse: PointParseStats,
}

impl SynthesisStats {
    /// Records left without a synthetic location
    pub fn missing(&self) -> usize {
        self.unmatched_towns + self.unresolved_towns + self.empty_towns
    }
}

/// Attach a synthetic location to every record the table can place
pub fn build_synthetic_locations(
    records: &mut [SaleRecord],
    table: &TownCoordinateTable,
) -> SynthesisStats {
    let mut stats = SynthesisStats::default();

    for record in records.iter_mut() {
        record.synthetic_location = None;
        record.synthetic = None;

        if record.town.trim().is_empty() {
            stats.empty_towns += 1;
            continue;
        }

        match table.lookup(&record.town) {
            TownLookup::Resolved(coordinates) => {
                let point = format_point(&coordinates.longitude, &coordinates.latitude);
                let outcome = parse_point(Some(&point));
                stats.parse.record(&outcome);

                record.synthetic = outcome.coordinate();
                record.synthetic_location = Some(point);
                stats.built += 1;
            }
            TownLookup::Unresolved => stats.unresolved_towns += 1,
            TownLookup::Unknown => {
                debug!("Town '{}' is not in the town table", record.town);
                stats.unmatched_towns += 1;
            }
        }
    }

    info!(
        "Synthetic locations: {} built, {} missing ({} unmatched, {} unresolved, {} without town)",
        stats.built,
        stats.missing(),
        stats.unmatched_towns,
        stats.unresolved_towns,
        stats.empty_towns
    );

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Coordinate, TownCoordinates};
    use crate::app::services::distance::compute_distances;

    fn table() -> TownCoordinateTable {
        let mut table = TownCoordinateTable::new();
        table.insert("Hartford", Some(TownCoordinates::new(41.76, -72.68)));
        table.insert("Danbury", Some(TownCoordinates::new("41.3948", "-73.4540")));
        table.insert("Atlantis", None);
        table.insert("Nowhere", Some(TownCoordinates::new("north", "west")));
        table
    }

    #[test]
    fn test_point_string_is_longitude_first() {
        let mut records = vec![SaleRecord::new("1", "Hartford")];
        let stats = build_synthetic_locations(&mut records, &table());

        assert_eq!(
            records[0].synthetic_location.as_deref(),
            Some("POINT (-72.68 41.76)")
        );
        assert_eq!(records[0].synthetic, Some(Coordinate::new(-72.68, 41.76)));
        assert_eq!(stats.built, 1);
    }

    #[test]
    fn test_synthetic_coordinates_match_table_numerically() {
        let mut records = vec![SaleRecord::new("1", "Danbury")];
        build_synthetic_locations(&mut records, &table());

        let synthetic = records[0].synthetic.unwrap();
        assert_eq!(synthetic.latitude, 41.3948);
        assert_eq!(synthetic.longitude, -73.4540);
    }

    #[test]
    fn test_record_without_location_gets_synthetic_but_no_distance() {
        let mut records = vec![SaleRecord::new("1", "Hartford")];
        build_synthetic_locations(&mut records, &table());
        let summary = compute_distances(&mut records);

        assert!(records[0].synthetic_location.is_some());
        assert_eq!(records[0].distance_km, None);
        assert_eq!(summary.incomplete, 1);
    }

    #[test]
    fn test_missing_towns_are_counted_by_reason() {
        let mut records = vec![
            SaleRecord::new("1", "Atlantis"),
            SaleRecord::new("2", "Springfield"),
            SaleRecord::new("3", " "),
            SaleRecord::new("4", "Hartford"),
        ];
        let stats = build_synthetic_locations(&mut records, &table());

        assert_eq!(stats.unresolved_towns, 1);
        assert_eq!(stats.unmatched_towns, 1);
        assert_eq!(stats.empty_towns, 1);
        assert_eq!(stats.built, 1);
        assert_eq!(stats.missing(), 3);
        assert!(records[..3].iter().all(|r| r.synthetic_location.is_none()));
    }

    #[test]
    fn test_non_numeric_table_entry_is_malformed() {
        let mut records = vec![SaleRecord::new("1", "Nowhere")];
        let stats = build_synthetic_locations(&mut records, &table());

        assert_eq!(
            records[0].synthetic_location.as_deref(),
            Some("POINT (west north)")
        );
        assert_eq!(records[0].synthetic, None);
        assert_eq!(stats.parse.malformed, 1);
    }
}
