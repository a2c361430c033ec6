//! Sales Geocheck Library
//!
//! A Rust library for reconciling the coordinates stated on real-estate sale
//! records against town centroids obtained from a geocoding service.
//!
//! This library provides tools for:
//! - Parsing `POINT (<lon> <lat>)` location strings into numeric coordinates
//! - Building and persisting a town → coordinate table backed by a geocoder
//! - Joining synthetic town-level locations onto every sale record
//! - Computing haversine distances between stated and synthetic locations
//! - Ranking records whose locations diverge beyond a distance threshold
//! - Graceful degradation with auditable counts of skipped and unresolved data

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod context;
    pub mod models;
    pub mod services {
        pub mod distance;
        pub mod geocoder;
        pub mod location_analysis;
        pub mod outlier_filter;
        pub mod pipeline;
        pub mod point_parser;
        pub mod record_io;
        pub mod synthetic_location;
        pub mod town_registry;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Coordinate, CoordinateValue, OutlierRow, SaleRecord, TownCoordinates};
pub use config::Config;

/// Result type alias for the geocheck library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for geocheck operations
///
/// Only problems with the run as a whole surface here. Bad rows, malformed
/// point strings and unresolved towns are counted and skipped instead.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV reading or writing error
    #[error("CSV error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// JSON encoding or decoding error
    #[error("JSON error in file '{file}': {message}")]
    Json {
        file: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required column is not present in the input header
    #[error("Required column '{column}' not found in '{file}'")]
    MissingColumn { file: String, column: String },

    /// Point string could not be parsed
    #[error(transparent)]
    PointParse(#[from] app::services::point_parser::PointParseError),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {message}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a JSON error with context
    pub fn json(
        file: impl Into<String>,
        message: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a missing column error
    pub fn missing_column(file: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            file: file.into(),
            column: column.into(),
        }
    }

    /// Create an HTTP client error
    pub fn http(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV processing failed".to_string(),
            source: Some(error),
        }
    }
}
