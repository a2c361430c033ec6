//! Configuration management and validation.
//!
//! Provides configuration structures for input/output locations, column
//! names, geocoding and outlier detection. Configuration is layered:
//! built-in defaults, then an optional TOML file, then command-line overrides.

use crate::app::services::outlier_filter::OutlierOrder;
use crate::constants::{
    self, CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_GEOCODER_CONCURRENCY, DEFAULT_GEOCODER_URL,
    DEFAULT_OUTPUT_DIR, DEFAULT_REGION, DEFAULT_REQUEST_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_THRESHOLD_KM, DEFAULT_TOP_LOCATIONS,
    DEFAULT_USER_AGENT, ENRICHED_FILE_NAME, MAX_GEOCODER_CONCURRENCY, OUTLIER_REPORT_FILE_NAME,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column names looked up in the input header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub serial_number: String,
    pub town: String,
    pub location: String,
    /// Optional pre-supplied longitude, used when `location` is empty
    pub longitude: String,
    /// Optional pre-supplied latitude, used when `location` is empty
    pub latitude: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            serial_number: constants::columns::SERIAL_NUMBER.to_string(),
            town: constants::columns::TOWN.to_string(),
            location: constants::columns::LOCATION.to_string(),
            longitude: constants::columns::LONGITUDE.to_string(),
            latitude: constants::columns::LATITUDE.to_string(),
        }
    }
}

/// Geocoding service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible service
    pub base_url: String,

    /// Region qualifier appended to each town name
    pub region: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Minimum milliseconds between consecutive requests
    pub request_interval_ms: u64,

    /// Concurrent lookups while building the town table
    pub concurrency: usize,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            region: DEFAULT_REGION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            request_interval_ms: DEFAULT_REQUEST_INTERVAL_MS,
            concurrency: DEFAULT_GEOCODER_CONCURRENCY,
        }
    }
}

/// Outlier detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Distances strictly greater than this are outliers, in kilometres
    pub threshold_km: f64,

    /// Report ordering
    pub order: OutlierOrder,

    /// Number of most frequent original locations shown in the analysis
    pub top_locations: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            threshold_km: DEFAULT_THRESHOLD_KM,
            order: OutlierOrder::default(),
            top_locations: DEFAULT_TOP_LOCATIONS,
        }
    }
}

/// Global configuration for a geocheck run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input sale record CSV
    pub input_path: PathBuf,

    /// Persisted town → coordinate table (JSON)
    pub town_table_path: PathBuf,

    /// Directory for the enriched records and outlier report
    pub output_dir: PathBuf,

    /// Re-query towns cached as unresolved
    pub refresh_unresolved: bool,

    /// Never call the geocoder; towns missing from the table stay unresolved
    pub offline: bool,

    pub columns: ColumnNames,

    pub geocoder: GeocoderConfig,

    pub outliers: OutlierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("sales.csv"),
            town_table_path: PathBuf::from("town_coordinates.json"),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            refresh_unresolved: false,
            offline: false,
            columns: ColumnNames::default(),
            geocoder: GeocoderConfig::default(),
            outliers: OutlierConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location (`<config dir>/sales-geocheck/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::configuration("Could not determine user config directory"))?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file; missing keys take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read config {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            Error::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load defaults, overlaid with `config_file` when given
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        match config_file {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Set the input record file
    pub fn with_input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    /// Set the town table file
    pub fn with_town_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.town_table_path = path.into();
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Set the outlier threshold in kilometres
    pub fn with_threshold_km(mut self, threshold_km: f64) -> Self {
        self.outliers.threshold_km = threshold_km;
        self
    }

    /// Set the outlier report ordering
    pub fn with_order(mut self, order: OutlierOrder) -> Self {
        self.outliers.order = order;
        self
    }

    /// Disable all geocoding lookups
    pub fn with_offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Re-query towns cached as unresolved
    pub fn with_refresh_unresolved(mut self) -> Self {
        self.refresh_unresolved = true;
        self
    }

    /// Configure the geocoding service
    pub fn with_geocoder(mut self, geocoder: GeocoderConfig) -> Self {
        self.geocoder = geocoder;
        self
    }

    /// Path of the enriched record file
    pub fn enriched_output_path(&self) -> PathBuf {
        self.output_dir.join(ENRICHED_FILE_NAME)
    }

    /// Path of the outlier report
    pub fn outlier_report_path(&self) -> PathBuf {
        self.output_dir.join(OUTLIER_REPORT_FILE_NAME)
    }

    /// Validate configuration values for consistency
    pub fn validate(&self) -> Result<()> {
        let threshold = self.outliers.threshold_km;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::configuration(format!(
                "Outlier threshold must be a non-negative number of kilometres, got {}",
                threshold
            )));
        }

        if self.geocoder.concurrency == 0 {
            return Err(Error::configuration(
                "Geocoder concurrency must be greater than 0",
            ));
        }

        if self.geocoder.concurrency > MAX_GEOCODER_CONCURRENCY {
            return Err(Error::configuration(format!(
                "Geocoder concurrency cannot exceed {}",
                MAX_GEOCODER_CONCURRENCY
            )));
        }

        if self.geocoder.timeout_secs == 0 {
            return Err(Error::configuration(
                "Geocoder timeout must be greater than 0 seconds",
            ));
        }

        if !self.offline && self.geocoder.base_url.trim().is_empty() {
            return Err(Error::configuration("Geocoder base URL cannot be empty"));
        }

        let columns = &self.columns;
        for (name, value) in [
            ("serial_number", &columns.serial_number),
            ("town", &columns.town),
            ("location", &columns.location),
        ] {
            if value.trim().is_empty() {
                return Err(Error::configuration(format!(
                    "Column name '{}' cannot be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}
