//! Application constants for sales geocheck
//!
//! This module contains default values, column names and geodesy constants
//! used throughout the application.

// =============================================================================
// Geodesy
// =============================================================================

/// Mean Earth radius used by the haversine formula, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Literal tag that opens a point string: `POINT (<lon> <lat>)`
pub const POINT_TAG: &str = "POINT";

// =============================================================================
// Outlier Detection
// =============================================================================

/// Records whose locations diverge by more than this many kilometres are outliers
pub const DEFAULT_THRESHOLD_KM: f64 = 50.0;

/// Number of most frequent original locations listed in the analysis
pub const DEFAULT_TOP_LOCATIONS: usize = 10;

// =============================================================================
// Geocoding
// =============================================================================

/// Region qualifier appended to every town query
pub const DEFAULT_REGION: &str = "Connecticut";

/// Public Nominatim search endpoint
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// User agent sent to the geocoding service (Nominatim rejects anonymous clients)
pub const DEFAULT_USER_AGENT: &str = concat!("sales-geocheck/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for geocoding lookups
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimum delay between geocoding requests (Nominatim usage policy: 1 req/s)
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 1000;

/// Concurrent geocoding lookups
pub const DEFAULT_GEOCODER_CONCURRENCY: usize = 1;

/// Upper bound accepted for geocoder concurrency
pub const MAX_GEOCODER_CONCURRENCY: usize = 32;

// =============================================================================
// File Layout
// =============================================================================

/// Default output directory for generated files
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// File name of the enriched record file within the output directory
pub const ENRICHED_FILE_NAME: &str = "enriched_sales.csv";

/// File name of the outlier report within the output directory
pub const OUTLIER_REPORT_FILE_NAME: &str = "distance_outliers.csv";

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "sales-geocheck";

/// Config file name within the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

// =============================================================================
// Column Names
// =============================================================================

/// Input column names with their defaults
pub mod columns {
    pub const SERIAL_NUMBER: &str = "Serial Number";
    pub const TOWN: &str = "Town";
    pub const LOCATION: &str = "Location";
    pub const LONGITUDE: &str = "Longitude";
    pub const LATITUDE: &str = "Latitude";
}

/// Columns appended to the enriched output, in order
pub mod derived_columns {
    pub const LONGITUDE: &str = "Longitude";
    pub const LATITUDE: &str = "Latitude";
    pub const SYNTH_LOCATION: &str = "Synth_Location";
    pub const SYNTH_LONGITUDE: &str = "Synth_Longitude";
    pub const SYNTH_LATITUDE: &str = "Synth_Latitude";
    pub const DISTANCE: &str = "Distance";

    /// All derived columns in output order
    pub const ALL: &[&str] = &[
        LONGITUDE,
        LATITUDE,
        SYNTH_LOCATION,
        SYNTH_LONGITUDE,
        SYNTH_LATITUDE,
        DISTANCE,
    ];
}
