//! End-to-end geocheck pipeline
//!
//! Composes the per-record stages into a single run:
//!
//! 1. **Load** sale records and parse their stated locations
//! 2. **Resolve** towns into the persisted town table (skipped offline)
//! 3. **Synthesize** town-level locations and compute distances
//! 4. **Filter** outliers and analyse location coverage
//! 5. **Write** the enriched records and the outlier report
//!
//! Every stage is a plain function over the record slice; only town
//! resolution is async. Bad rows, malformed points and unresolved towns are
//! counted in the [`RunSummary`] rather than aborting the run.

pub mod processor;
pub mod stats;

#[cfg(test)]
pub mod tests;

pub use processor::{GeoCheckPipeline, GeoCheckResult};
pub use stats::{OutputPaths, RunSummary, TownTableSummary};
