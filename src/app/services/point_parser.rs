//! Point string parsing and formatting
//!
//! Locations are encoded as `POINT (<lon> <lat>)`. Parsing is lenient
//! project-wide: a malformed string becomes "no coordinate" and is counted,
//! so one bad row never stops a run. [`parse_point_strict`] exposes the
//! underlying error for callers that want it.

use crate::app::models::{Coordinate, CoordinateValue, SaleRecord};
use crate::constants::POINT_TAG;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, warn};

static POINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*POINT\s*\(\s*(\S+)\s+(\S+)\s*\)\s*$").expect("point pattern is valid")
});

/// Reasons a non-empty point string could not be parsed
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PointParseError {
    #[error("point string '{input}' does not match 'POINT (<lon> <lat>)'")]
    InvalidFormat { input: String },

    #[error("invalid {axis} '{token}' in point string '{input}'")]
    InvalidNumber {
        input: String,
        axis: &'static str,
        token: String,
    },
}

/// Outcome of the lenient parse
#[derive(Debug, Clone, PartialEq)]
pub enum PointParse {
    Parsed(Coordinate),
    Absent,
    Malformed(PointParseError),
}

impl PointParse {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            PointParse::Parsed(coordinate) => Some(*coordinate),
            _ => None,
        }
    }
}

/// Counters for a batch of point strings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointParseStats {
    pub parsed: usize,
    pub absent: usize,
    pub malformed: usize,
}

impl PointParseStats {
    pub fn record(&mut self, outcome: &PointParse) {
        match outcome {
            PointParse::Parsed(_) => self.parsed += 1,
            PointParse::Absent => self.absent += 1,
            PointParse::Malformed(_) => self.malformed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.parsed + self.absent + self.malformed
    }
}

/// Parse a point string, failing on anything malformed
pub fn parse_point_strict(input: &str) -> Result<Coordinate, PointParseError> {
    let captures = POINT_PATTERN
        .captures(input)
        .ok_or_else(|| PointParseError::InvalidFormat {
            input: input.to_string(),
        })?;

    let longitude = parse_axis(input, "longitude", &captures[1])?;
    let latitude = parse_axis(input, "latitude", &captures[2])?;

    Ok(Coordinate::new(longitude, latitude))
}

fn parse_axis(input: &str, axis: &'static str, token: &str) -> Result<f64, PointParseError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| PointParseError::InvalidNumber {
            input: input.to_string(),
            axis,
            token: token.to_string(),
        })
}

/// Parse an optional point string leniently
///
/// `None`, empty and whitespace-only input are absent rather than malformed:
/// that is how a missing CSV cell arrives.
pub fn parse_point(input: Option<&str>) -> PointParse {
    let Some(text) = input.filter(|text| !text.trim().is_empty()) else {
        return PointParse::Absent;
    };

    match parse_point_strict(text) {
        Ok(coordinate) => PointParse::Parsed(coordinate),
        Err(e) => {
            debug!("{}", e);
            PointParse::Malformed(e)
        }
    }
}

/// Format a point string, longitude first
///
/// Tokens are written exactly as given so that parsing the result yields the
/// same numbers the geocoder returned.
pub fn format_point(longitude: &CoordinateValue, latitude: &CoordinateValue) -> String {
    format!("{POINT_TAG} ({longitude} {latitude})")
}

/// Parse the stated location of every record into its original coordinate
///
/// A record with no stated location keeps whatever coordinate the reader
/// already supplied from separate longitude/latitude columns.
pub fn parse_original_locations(records: &mut [SaleRecord]) -> PointParseStats {
    let mut stats = PointParseStats::default();

    for record in records.iter_mut() {
        let outcome = parse_point(record.location.as_deref());
        stats.record(&outcome);

        match outcome {
            PointParse::Parsed(coordinate) => record.original = Some(coordinate),
            PointParse::Malformed(_) => record.original = None,
            PointParse::Absent => {}
        }
    }

    if stats.malformed > 0 {
        warn!(
            "{} of {} stated locations were malformed and ignored",
            stats.malformed,
            stats.total()
        );
    }

    stats
}
