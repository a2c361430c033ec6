//! Persisted town → coordinate table
//!
//! On disk the table is a JSON object mapping each town name to a
//! `[latitude, longitude]` pair, or `null` when geocoding found nothing:
//!
//! ```json
//! { "Andover": ["41.7373", "-72.3704"], "Unknown Town": null }
//! ```
//!
//! A `null` entry is a cached negative result, not an absent key. Tables that
//! record failures as `[null, null]` load the same way, and entries that do
//! not decode at all are skipped with a warning.

use crate::app::models::{CoordinateValue, TownCoordinates};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Result of looking a town up in the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TownLookup<'a> {
    /// The town has coordinates
    Resolved(&'a TownCoordinates),
    /// The town was looked up before and has no coordinates
    Unresolved,
    /// The town is not in the table
    Unknown,
}

/// Town name → optional coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TownCoordinateTable {
    entries: BTreeMap<String, Option<TownCoordinates>>,
}

impl TownCoordinateTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a town up
    pub fn lookup(&self, town: &str) -> TownLookup<'_> {
        match self.entries.get(town) {
            Some(Some(coordinates)) => TownLookup::Resolved(coordinates),
            Some(None) => TownLookup::Unresolved,
            None => TownLookup::Unknown,
        }
    }

    /// Cached entry for a town, `None` when the town was never looked up
    pub fn get(&self, town: &str) -> Option<&Option<TownCoordinates>> {
        self.entries.get(town)
    }

    pub fn contains(&self, town: &str) -> bool {
        self.entries.contains_key(town)
    }

    /// Record a lookup result, replacing any previous entry
    pub fn insert(&mut self, town: impl Into<String>, coordinates: Option<TownCoordinates>) {
        self.entries.insert(town.into(), coordinates);
    }

    /// Drop unresolved entries unless `keep` accepts the town; returns the number dropped
    pub fn remove_unresolved_except<F>(&mut self, keep: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.entries.len();
        self.entries
            .retain(|town, coordinates| coordinates.is_some() || keep(town));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of towns with coordinates
    pub fn resolved_count(&self) -> usize {
        self.entries.values().filter(|c| c.is_some()).count()
    }

    /// Number of towns cached as unresolved
    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|c| c.is_none()).count()
    }

    /// Towns cached as unresolved, in name order
    pub fn unresolved_towns(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, coordinates)| coordinates.is_none())
            .map(|(town, _)| town.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&TownCoordinates>)> {
        self.entries
            .iter()
            .map(|(town, coordinates)| (town.as_str(), coordinates.as_ref()))
    }

    /// Load a table from JSON; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "Town table {} not found, starting with an empty table",
                path.display()
            );
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read town table {}", path.display()), e))?;

        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| {
                Error::json(
                    path.display().to_string(),
                    "Failed to decode town table",
                    e,
                )
            })?;

        let mut table = Self::new();
        let mut skipped = 0;
        for (town, value) in raw {
            match decode_entry(value) {
                Ok(coordinates) => table.insert(town, coordinates),
                Err(e) => {
                    warn!(
                        "Skipping town table entry '{}' in {}: {}",
                        town,
                        path.display(),
                        e
                    );
                    skipped += 1;
                }
            }
        }

        info!(
            "Town coordinates loaded from {}: {} towns ({} unresolved, {} skipped)",
            path.display(),
            table.len(),
            table.unresolved_count(),
            skipped
        );

        Ok(table)
    }

    /// Write the table atomically
    ///
    /// The JSON is written to a temporary file next to `path` and renamed over
    /// it, so a crash mid-write never leaves a truncated table behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        std::fs::create_dir_all(parent).map_err(|e| {
            Error::io(format!("Failed to create directory {}", parent.display()), e)
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
            Error::io(
                format!("Failed to create temporary file in {}", parent.display()),
                e,
            )
        })?;

        serde_json::to_writer_pretty(&mut temp, self).map_err(|e| {
            Error::json(path.display().to_string(), "Failed to encode town table", e)
        })?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;

        temp.persist(path).map_err(|e| {
            Error::io(
                format!("Failed to publish town table {}", path.display()),
                e.error,
            )
        })?;

        debug!("Saved {} towns to {}", self.len(), path.display());
        Ok(())
    }
}

/// Decode one table value
///
/// `null`, and any pair with a `null` side, is a cached unresolved town.
fn decode_entry(
    value: serde_json::Value,
) -> std::result::Result<Option<TownCoordinates>, serde_json::Error> {
    let pair: Option<(Option<CoordinateValue>, Option<CoordinateValue>)> =
        serde_json::from_value(value)?;

    Ok(match pair {
        Some((Some(latitude), Some(longitude))) => Some(TownCoordinates {
            latitude,
            longitude,
        }),
        _ => None,
    })
}

impl FromIterator<(String, Option<TownCoordinates>)> for TownCoordinateTable {
    fn from_iter<I: IntoIterator<Item = (String, Option<TownCoordinates>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
