//! Geocoding collaborator for town centroids
//!
//! The resolver only depends on the [`Geocoder`] trait. The production
//! implementation is [`NominatimGeocoder`]; tests substitute in-memory fakes.
//!
//! A lookup returns an explicit `Result` whose error says why no coordinate
//! came back. Every failure kind is treated the same by the pipeline (the town
//! stays unresolved), but the reason is kept for logging and run statistics.

pub mod nominatim;

pub use nominatim::NominatimGeocoder;

use crate::app::models::TownCoordinates;
use async_trait::async_trait;
use serde::Serialize;

/// Why a geocoding lookup produced no coordinate
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResolutionFailure {
    /// The service answered but had no candidates
    #[error("no geocoding results")]
    NoResults,

    /// The service answered with a non-success status
    #[error("geocoding service returned HTTP {0}")]
    HttpStatus(u16),

    /// The service could not be reached
    #[error("geocoding service unreachable: {0}")]
    Transport(String),

    /// The response body was not the expected shape
    #[error("invalid geocoding response: {0}")]
    InvalidResponse(String),
}

impl ResolutionFailure {
    /// Coarse category used for statistics
    pub fn kind(&self) -> FailureKind {
        match self {
            ResolutionFailure::NoResults => FailureKind::Miss,
            ResolutionFailure::HttpStatus(_)
            | ResolutionFailure::Transport(_)
            | ResolutionFailure::InvalidResponse(_) => FailureKind::Transport,
        }
    }
}

/// Resolution failures grouped for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// The service had no match for the town
    Miss,
    /// The service could not answer
    Transport,
}

/// Town name to coordinate lookup
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `town`, qualified by the geocoder's region, to its first ranked result
    async fn geocode(&self, town: &str) -> Result<TownCoordinates, ResolutionFailure>;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for std::sync::Arc<G> {
    async fn geocode(&self, town: &str) -> Result<TownCoordinates, ResolutionFailure> {
        (**self).geocode(town).await
    }
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for &G {
    async fn geocode(&self, town: &str) -> Result<TownCoordinates, ResolutionFailure> {
        (**self).geocode(town).await
    }
}

/// Build the free-text query sent for a town
pub fn town_query(town: &str, region: &str) -> String {
    if region.trim().is_empty() {
        town.trim().to_string()
    } else {
        format!("{}, {}", town.trim(), region.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_town_query_appends_region() {
        assert_eq!(town_query("Hartford", "Connecticut"), "Hartford, Connecticut");
        assert_eq!(town_query(" New Haven ", "Connecticut"), "New Haven, Connecticut");
        assert_eq!(town_query("Hartford", ""), "Hartford");
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(ResolutionFailure::NoResults.kind(), FailureKind::Miss);
        assert_eq!(ResolutionFailure::HttpStatus(503).kind(), FailureKind::Transport);
        assert_eq!(
            ResolutionFailure::Transport("timeout".into()).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            ResolutionFailure::InvalidResponse("not json".into()).kind(),
            FailureKind::Transport
        );
    }
}
