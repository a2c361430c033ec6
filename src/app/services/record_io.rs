//! Sale record CSV reading and writing
//!
//! The reader maps configured header names to column indices, keeps every
//! other input column as pass-through data and skips rows it cannot read.
//! The writers produce the enriched record file and the outlier report.

use crate::app::models::{Coordinate, OutlierRow, SaleRecord};
use crate::config::ColumnNames;
use crate::constants::{columns, derived_columns};
use crate::{Error, Result};
use csv::StringRecord;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column indices resolved from an input header
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub serial_number: usize,
    pub town: usize,
    pub location: Option<usize>,
    pub longitude: Option<usize>,
    pub latitude: Option<usize>,
    /// Indices copied to the enriched output, in input order
    pub passthrough: Vec<usize>,
}

impl ColumnLayout {
    /// Resolve column positions; serial number and town are required
    pub fn analyze(headers: &StringRecord, names: &ColumnNames, file: &str) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|header| header.trim() == name);

        let serial_number = position(names.serial_number.as_str())
            .ok_or_else(|| Error::missing_column(file, &names.serial_number))?;
        let town = position(names.town.as_str())
            .ok_or_else(|| Error::missing_column(file, &names.town))?;
        let location = position(names.location.as_str());
        let longitude = position(names.longitude.as_str());
        let latitude = position(names.latitude.as_str());

        // Supplied coordinates and derived columns are rewritten on output
        let passthrough = headers
            .iter()
            .enumerate()
            .filter(|(index, header)| {
                Some(*index) != longitude
                    && Some(*index) != latitude
                    && !derived_columns::ALL.contains(&header.trim())
            })
            .map(|(index, _)| index)
            .collect();

        Ok(Self {
            serial_number,
            town,
            location,
            longitude,
            latitude,
            passthrough,
        })
    }
}

/// Counters for reading an input file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadStats {
    /// Data rows encountered
    pub rows_read: usize,
    /// Rows turned into records
    pub records: usize,
    /// Rows that could not be read
    pub skipped_rows: usize,
    /// Records sharing a serial number with an earlier record
    pub duplicate_serials: usize,
    /// Records whose coordinate came from separate longitude/latitude columns
    pub coordinate_fallbacks: usize,
    /// The input had no location column at all
    pub missing_location_column: bool,
}

/// Records read from an input file together with their pass-through header
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    pub headers: Vec<String>,
    pub records: Vec<SaleRecord>,
    pub stats: ReadStats,
}

fn cell(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|index| record.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn cell_f64(record: &StringRecord, index: Option<usize>) -> Option<f64> {
    cell(record, index)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Read sale records from a CSV file
pub fn read_records(path: &Path, names: &ColumnNames) -> Result<RecordTable> {
    let file = path.display().to_string();

    if !path.exists() {
        return Err(Error::file_not_found(file));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::csv_parsing(&file, "Failed to open CSV file", Some(e)))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::csv_parsing(&file, "Failed to read CSV header", Some(e)))?
        .clone();

    let layout = ColumnLayout::analyze(&headers, names, &file)?;
    let mut stats = ReadStats {
        missing_location_column: layout.location.is_none(),
        ..Default::default()
    };

    if stats.missing_location_column {
        warn!(
            "Column '{}' not found in {}; all stated locations are absent",
            names.location, file
        );
    }

    let passthrough_headers = layout
        .passthrough
        .iter()
        .map(|&index| headers[index].to_string())
        .collect();

    let mut records = Vec::new();
    let mut seen_serials = HashSet::new();

    for (row_index, row) in reader.records().enumerate() {
        stats.rows_read += 1;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable row {} in {}: {}", row_index + 1, file, e);
                stats.skipped_rows += 1;
                continue;
            }
        };

        let mut record = SaleRecord::new(
            cell(&row, Some(layout.serial_number)).unwrap_or_default(),
            cell(&row, Some(layout.town)).unwrap_or_default(),
        );
        record.location = cell(&row, layout.location).map(str::to_string);

        if record.location.is_none() {
            if let (Some(longitude), Some(latitude)) = (
                cell_f64(&row, layout.longitude),
                cell_f64(&row, layout.latitude),
            ) {
                record.original = Some(Coordinate::new(longitude, latitude));
                stats.coordinate_fallbacks += 1;
            }
        }

        record.passthrough = layout
            .passthrough
            .iter()
            .map(|&index| row.get(index).unwrap_or_default().to_string())
            .collect();

        if !seen_serials.insert(record.serial_number.clone()) {
            debug!("Duplicate serial number: {}", record.serial_number);
            stats.duplicate_serials += 1;
        }

        records.push(record);
    }

    stats.records = records.len();

    if stats.duplicate_serials > 0 {
        warn!(
            "{} records in {} share a serial number with an earlier record",
            stats.duplicate_serials, file
        );
    }

    info!(
        "Read {} records from {} ({} rows skipped)",
        stats.records, file, stats.skipped_rows
    );

    Ok(RecordTable {
        headers: passthrough_headers,
        records,
        stats,
    })
}

/// Distinct non-empty town names in first-seen order
pub fn unique_towns(records: &[SaleRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| record.town.trim())
        .filter(|town| !town.is_empty() && seen.insert(*town))
        .map(str::to_string)
        .collect()
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn create_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::io(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }

    csv::Writer::from_path(path).map_err(|e| {
        Error::csv_parsing(path.display().to_string(), "Failed to create CSV file", Some(e))
    })
}

/// Write every record with its derived columns appended
///
/// Absent values are written as empty cells. Returns the number of records written.
pub fn write_enriched(path: &Path, headers: &[String], records: &[SaleRecord]) -> Result<usize> {
    let file = path.display().to_string();
    let mut writer = create_writer(path)?;
    let write_error =
        |e: csv::Error| Error::csv_parsing(&file, "Failed to write enriched record", Some(e));

    writer
        .write_record(
            headers
                .iter()
                .map(String::as_str)
                .chain(derived_columns::ALL.iter().copied()),
        )
        .map_err(write_error)?;

    for record in records {
        let derived = [
            optional_number(record.original.map(|c| c.longitude)),
            optional_number(record.original.map(|c| c.latitude)),
            record.synthetic_location.clone().unwrap_or_default(),
            optional_number(record.synthetic.map(|c| c.longitude)),
            optional_number(record.synthetic.map(|c| c.latitude)),
            optional_number(record.distance_km),
        ];

        writer
            .write_record(record.passthrough.iter().chain(derived.iter()))
            .map_err(write_error)?;
    }

    writer
        .flush()
        .map_err(|e| Error::io(format!("Failed to flush {}", file), e))?;

    info!("Wrote {} enriched records to {}", records.len(), file);
    Ok(records.len())
}

/// Write the outlier report (`Serial Number, Town, Distance`)
pub fn write_outlier_report(path: &Path, outliers: &[OutlierRow]) -> Result<usize> {
    let file = path.display().to_string();
    let mut writer = create_writer(path)?;
    let write_error =
        |e: csv::Error| Error::csv_parsing(&file, "Failed to write outlier report", Some(e));

    writer
        .write_record([columns::SERIAL_NUMBER, columns::TOWN, derived_columns::DISTANCE])
        .map_err(write_error)?;

    for outlier in outliers {
        let distance = outlier.distance_km.to_string();
        writer
            .write_record([
                outlier.serial_number.as_str(),
                outlier.town.as_str(),
                distance.as_str(),
            ])
            .map_err(write_error)?;
    }

    writer
        .flush()
        .map_err(|e| Error::io(format!("Failed to flush {}", file), e))?;

    info!("Wrote {} outliers to {}", outliers.len(), file);
    Ok(outliers.len())
}
