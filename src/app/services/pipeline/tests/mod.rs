//! Shared fixtures for pipeline tests

use crate::config::Config;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub mod run_tests;

pub use crate::app::services::town_registry::tests::MockGeocoder;

/// Input with one outlier, one in-town sale, one sale without a stated
/// location and one sale in a town the geocoder does not know
pub const SALES_CSV: &str = "\
Serial Number,List Year,Town,Sale Amount,Location
200001,2020,Hartford,250000,POINT (-72.68 41.76)
200002,2020,Hartford,180000,POINT (-73.5 41.0)
200003,2020,Hartford,199000,
200004,2020,Atlantis,99000,POINT (-72.0 41.0)
";

/// Geocoder that knows Hartford only
pub fn hartford_geocoder() -> MockGeocoder {
    MockGeocoder::new().with_town("Hartford", "41.76", "-72.68")
}

/// Write `content` as the input file and return a config rooted in `dir`
pub fn config_in(dir: &TempDir, content: &str) -> Config {
    let root = dir.path();
    fs::write(root.join("sales.csv"), content).unwrap();
    test_config(root)
}

pub fn test_config(root: &Path) -> Config {
    Config::default()
        .with_input_path(root.join("sales.csv"))
        .with_town_table_path(root.join("towns.json"))
        .with_output_dir(root.join("output"))
}
