//! Shared test utilities and fixtures for town registry tests

use crate::app::models::TownCoordinates;
use crate::app::services::geocoder::{Geocoder, ResolutionFailure};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};


/// In-memory geocoder with canned answers and a call log
///
/// Towns without a canned answer produce [`ResolutionFailure::NoResults`].
#[derive(Debug, Default)]
pub struct MockGeocoder {
    responses: HashMap<String, Result<TownCoordinates, ResolutionFailure>>,
    calls: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_town(mut self, town: &str, latitude: &str, longitude: &str) -> Self {
        self.responses.insert(
            town.to_string(),
            Ok(TownCoordinates::new(latitude, longitude)),
        );
        self
    }

    pub fn with_failure(mut self, town: &str, failure: ResolutionFailure) -> Self {
        self.responses.insert(town.to_string(), Err(failure));
        self
    }

    /// Total number of geocode calls made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of geocode calls made for `town`
    pub fn calls_for(&self, town: &str) -> usize {
        self.queried
            .lock()
            .unwrap()
            .iter()
            .filter(|queried| queried.as_str() == town)
            .count()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, town: &str) -> Result<TownCoordinates, ResolutionFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(town.to_string());
        tokio::task::yield_now().await;

        self.responses
            .get(town)
            .cloned()
            .unwrap_or(Err(ResolutionFailure::NoResults))
    }
}

/// Hartford as Nominatim reports it
pub fn hartford() -> TownCoordinates {
    TownCoordinates::new("41.7658", "-72.6734")
}

/// Danbury as Nominatim reports it
pub fn danbury() -> TownCoordinates {
    TownCoordinates::new("41.3948", "-73.4540")
}
