//! Town registry service for town centroid lookups
//!
//! This module maintains the town → coordinate table that synthetic locations
//! are built from. The table is persisted as JSON, reused across runs, and
//! filled in by a [`TownCoordinateResolver`] that asks the geocoder only about
//! towns the table has never seen.

pub mod resolver;
pub mod table;

#[cfg(test)]
pub mod tests;

// Re-export key types for convenience
pub use resolver::{ResolutionStats, TownCoordinateResolver};
pub use table::{TownCoordinateTable, TownLookup};
