//! Cached town resolution
//!
//! The resolver consults the town table first and falls back to the geocoder
//! only on a miss. Every outcome, including failures, is written back to the
//! table, so each town is looked up at most once per table lifetime. There
//! are no automatic retries; callers that want one use
//! [`TownCoordinateResolver::refresh_unresolved`] before resolving.

use super::table::TownCoordinateTable;
use crate::app::models::TownCoordinates;
use crate::app::services::geocoder::{FailureKind, Geocoder, ResolutionFailure};
use crate::constants::DEFAULT_GEOCODER_CONCURRENCY;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Counters for a resolution pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionStats {
    /// Distinct towns asked for
    pub towns_requested: usize,
    /// Towns answered from the table without a lookup
    pub cache_hits: usize,
    /// Geocoder calls made
    pub lookups: usize,
    /// Lookups that produced coordinates
    pub resolved: usize,
    /// Lookups where the service had no result
    pub misses: usize,
    /// Lookups where the service could not answer
    pub transport_failures: usize,
    /// Cached unresolved entries dropped for another attempt
    pub refreshed: usize,
}

impl ResolutionStats {
    /// Lookups that produced no coordinate, whatever the reason
    pub fn unresolved(&self) -> usize {
        self.misses + self.transport_failures
    }
}

/// Town → coordinate resolver over a [`Geocoder`] with a persistent cache
pub struct TownCoordinateResolver<G> {
    geocoder: G,
    table: TownCoordinateTable,
    stats: ResolutionStats,
    attempted: HashSet<String>,
    concurrency: usize,
}

impl<G: Geocoder> TownCoordinateResolver<G> {
    /// Create a resolver seeded with an existing table
    pub fn new(geocoder: G, table: TownCoordinateTable) -> Self {
        Self {
            geocoder,
            table,
            stats: ResolutionStats::default(),
            attempted: HashSet::new(),
            concurrency: DEFAULT_GEOCODER_CONCURRENCY,
        }
    }

    /// Set the number of lookups allowed in flight during [`Self::resolve_all`]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Drop cached unresolved towns so they are looked up again
    ///
    /// Towns already attempted by this resolver are kept, preserving the
    /// one-lookup-per-run guarantee.
    pub fn refresh_unresolved(&mut self) -> usize {
        let attempted = &self.attempted;
        let dropped = self
            .table
            .remove_unresolved_except(|town| attempted.contains(town));
        self.stats.refreshed += dropped;

        if dropped > 0 {
            info!("Dropped {} cached unresolved towns for another attempt", dropped);
        }
        dropped
    }

    /// Resolve one town
    pub async fn resolve(&mut self, town: &str) -> Option<TownCoordinates> {
        if town.trim().is_empty() {
            return None;
        }

        self.stats.towns_requested += 1;
        if let Some(cached) = self.table.get(town) {
            self.stats.cache_hits += 1;
            return cached.clone();
        }

        let outcome = self.geocoder.geocode(town).await;
        self.record_outcome(town, outcome)
    }

    /// Resolve a batch of towns, looking up cache misses concurrently
    ///
    /// Duplicate and empty town names are ignored. Results merge into the
    /// table by town name, so concurrent lookups never conflict.
    pub async fn resolve_all<I, S>(&mut self, towns: I, progress: Option<&ProgressBar>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut misses = Vec::new();

        for town in towns {
            let town = town.as_ref();
            if town.trim().is_empty() || !seen.insert(town.to_string()) {
                continue;
            }

            self.stats.towns_requested += 1;
            if self.table.contains(town) {
                self.stats.cache_hits += 1;
            } else {
                misses.push(town.to_string());
            }
        }

        debug!(
            "{} towns requested, {} cached, {} to look up",
            seen.len(),
            seen.len() - misses.len(),
            misses.len()
        );

        if let Some(pb) = progress {
            pb.set_length(misses.len() as u64);
        }

        let geocoder = &self.geocoder;
        let outcomes: Vec<(String, Result<TownCoordinates, ResolutionFailure>)> =
            stream::iter(misses)
                .map(|town| async move {
                    let outcome = geocoder.geocode(&town).await;
                    if let Some(pb) = progress {
                        pb.set_message(town.clone());
                        pb.inc(1);
                    }
                    (town, outcome)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        for (town, outcome) in outcomes {
            self.record_outcome(&town, outcome);
        }

        info!(
            "Town resolution: {} requested, {} cached, {} looked up ({} resolved, {} unresolved)",
            self.stats.towns_requested,
            self.stats.cache_hits,
            self.stats.lookups,
            self.stats.resolved,
            self.stats.unresolved()
        );
    }

    fn record_outcome(
        &mut self,
        town: &str,
        outcome: Result<TownCoordinates, ResolutionFailure>,
    ) -> Option<TownCoordinates> {
        self.stats.lookups += 1;
        self.attempted.insert(town.to_string());

        let coordinates = match outcome {
            Ok(coordinates) => {
                self.stats.resolved += 1;
                info!("Fetched coordinates for town: {}", town);
                Some(coordinates)
            }
            Err(failure) => {
                match failure.kind() {
                    FailureKind::Miss => self.stats.misses += 1,
                    FailureKind::Transport => self.stats.transport_failures += 1,
                }
                warn!("Could not resolve town '{}': {}", town, failure);
                None
            }
        };

        self.table.insert(town, coordinates.clone());
        coordinates
    }

    pub fn table(&self) -> &TownCoordinateTable {
        &self.table
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    /// Finish resolving, handing back the table and statistics
    pub fn into_parts(self) -> (TownCoordinateTable, ResolutionStats) {
        (self.table, self.stats)
    }
}
