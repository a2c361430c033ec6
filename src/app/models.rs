//! Data models for sale record geochecking
//!
//! This module contains the core data structures for sale records, parsed
//! coordinates and the geocoder-native town coordinates that are persisted in
//! the town table.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Coordinates
// =============================================================================

/// A parsed longitude/latitude pair in decimal degrees
///
/// The pair is atomic: a record either has both axes or neither.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude in WGS84 decimal degrees
    pub longitude: f64,

    /// Latitude in WGS84 decimal degrees
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// A single coordinate scalar as returned by the geocoding service
///
/// Nominatim returns latitude and longitude as JSON strings while hand-made
/// tables usually hold numbers. Both are kept verbatim; numeric coercion is
/// left to the point parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    /// Coerce to a finite `f64`, if possible
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            CoordinateValue::Number(value) => *value,
            CoordinateValue::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for CoordinateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateValue::Number(value) => write!(f, "{value}"),
            CoordinateValue::Text(text) => write!(f, "{}", text.trim()),
        }
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        CoordinateValue::Number(value)
    }
}

impl From<&str> for CoordinateValue {
    fn from(value: &str) -> Self {
        CoordinateValue::Text(value.to_string())
    }
}

impl From<String> for CoordinateValue {
    fn from(value: String) -> Self {
        CoordinateValue::Text(value)
    }
}

/// Town centroid as resolved by the geocoder
///
/// Serialized as a `[latitude, longitude]` pair, the order the geocoder
/// returns them in. Point strings are longitude first; keeping named fields
/// here means the swap happens in exactly one place, the point formatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(CoordinateValue, CoordinateValue)",
    into = "(CoordinateValue, CoordinateValue)"
)]
pub struct TownCoordinates {
    pub latitude: CoordinateValue,
    pub longitude: CoordinateValue,
}

impl TownCoordinates {
    pub fn new(latitude: impl Into<CoordinateValue>, longitude: impl Into<CoordinateValue>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

impl From<(CoordinateValue, CoordinateValue)> for TownCoordinates {
    fn from((latitude, longitude): (CoordinateValue, CoordinateValue)) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<TownCoordinates> for (CoordinateValue, CoordinateValue) {
    fn from(coordinates: TownCoordinates) -> Self {
        (coordinates.latitude, coordinates.longitude)
    }
}

// =============================================================================
// Sale Records
// =============================================================================

/// A real-estate sale record moving through the geocheck pipeline
///
/// Read once from the input file and enriched in place by each stage.
/// Records are never dropped; the outlier report is a filtered view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleRecord {
    /// Serial number identifying the sale
    pub serial_number: String,

    /// Town name used for the synthetic location lookup
    pub town: String,

    /// Stated location point string, if any
    pub location: Option<String>,

    /// Parsed stated coordinates
    pub original: Option<Coordinate>,

    /// Point string synthesized from the town table
    pub synthetic_location: Option<String>,

    /// Parsed synthetic coordinates
    pub synthetic: Option<Coordinate>,

    /// Great-circle distance between original and synthetic coordinates
    pub distance_km: Option<f64>,

    /// Every input field not owned by the pipeline, in input column order
    pub passthrough: Vec<String>,
}

impl SaleRecord {
    /// Create a bare record with a serial number and town
    pub fn new(serial_number: impl Into<String>, town: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            town: town.into(),
            ..Default::default()
        }
    }

    /// Attach a stated location point string
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Whether all four coordinates needed for a distance are present
    pub fn has_complete_coordinates(&self) -> bool {
        self.original.is_some() && self.synthetic.is_some()
    }
}

/// Projection of a record written to the outlier report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierRow {
    pub serial_number: String,
    pub town: String,
    pub distance_km: f64,
}
