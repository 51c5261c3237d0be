//! CSV-backed trip table.
//!
//! Rows are kept as strings so every input column survives the round trip;
//! derived columns are appended on the right.

use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RowError, TableError};
use crate::models::GeoPoint;
use crate::planner::PlanRequest;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// In-memory table of trip records
#[derive(Debug, Clone, Default)]
pub struct TripTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TripTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != headers.len() {
                return Err(TableError::RaggedRow {
                    row,
                    found: cells.len(),
                    expected: headers.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let table = Self::from_reader(std::fs::File::open(path)?)?;
        info!("Read {} trips from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Self { headers, rows })
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let path = path.as_ref();
        self.write_to(std::fs::File::create(path)?)?;
        info!("Wrote {} trips to {}", self.len(), path.display());
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Index of `name`, appending an empty column if it does not exist yet
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Ok(index) = self.column_index(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Overwrite one cell; out-of-range positions are ignored
    pub fn set(&mut self, row: usize, column: usize, value: String) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value;
        }
    }
}

/// Known input layouts of the trip data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// GPS traces: `start_lat`, `start_lon`, `end_lat`, `end_lon`, `start_time`
    Gps,
    /// Car-sharing rentals: `pickup_latitude`, ... `dropoff_longitude`, `pickup_datetime`
    Rental,
}

/// Names of the columns that describe a trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSchema {
    pub origin_lat: String,
    pub origin_lon: String,
    pub destination_lat: String,
    pub destination_lon: String,
    pub start_time: String,
}

impl TripSchema {
    pub fn gps() -> Self {
        Self {
            origin_lat: "start_lat".to_string(),
            origin_lon: "start_lon".to_string(),
            destination_lat: "end_lat".to_string(),
            destination_lon: "end_lon".to_string(),
            start_time: "start_time".to_string(),
        }
    }

    pub fn rental() -> Self {
        Self {
            origin_lat: "pickup_latitude".to_string(),
            origin_lon: "pickup_longitude".to_string(),
            destination_lat: "dropoff_latitude".to_string(),
            destination_lon: "dropoff_longitude".to_string(),
            start_time: "pickup_datetime".to_string(),
        }
    }

    pub fn for_variant(variant: SchemaVariant) -> Self {
        match variant {
            SchemaVariant::Gps => Self::gps(),
            SchemaVariant::Rental => Self::rental(),
        }
    }

    pub fn columns(&self) -> [&str; 5] {
        [
            self.origin_lat.as_str(),
            self.origin_lon.as_str(),
            self.destination_lat.as_str(),
            self.destination_lon.as_str(),
            self.start_time.as_str(),
        ]
    }

    /// Look the columns up in a table header
    pub fn resolve(&self, table: &TripTable) -> Result<TripColumns, TableError> {
        Ok(TripColumns {
            origin_lat: (self.origin_lat.clone(), table.column_index(&self.origin_lat)?),
            origin_lon: (self.origin_lon.clone(), table.column_index(&self.origin_lon)?),
            destination_lat: (
                self.destination_lat.clone(),
                table.column_index(&self.destination_lat)?,
            ),
            destination_lon: (
                self.destination_lon.clone(),
                table.column_index(&self.destination_lon)?,
            ),
            start_time: (self.start_time.clone(), table.column_index(&self.start_time)?),
        })
    }
}

/// Trip columns resolved against a concrete header
#[derive(Debug, Clone)]
pub struct TripColumns {
    origin_lat: (String, usize),
    origin_lon: (String, usize),
    destination_lat: (String, usize),
    destination_lon: (String, usize),
    start_time: (String, usize),
}

impl TripColumns {
    pub fn origin(&self, row: &[String]) -> Result<GeoPoint, RowError> {
        read_point(row, &self.origin_lat, &self.origin_lon)
    }

    pub fn destination(&self, row: &[String]) -> Result<GeoPoint, RowError> {
        read_point(row, &self.destination_lat, &self.destination_lon)
    }

    pub fn departure(&self, row: &[String]) -> Result<NaiveDateTime, RowError> {
        let value = cell(row, self.start_time.1);
        parse_timestamp(value).ok_or_else(|| RowError::InvalidTimestamp {
            column: self.start_time.0.clone(),
            value: value.to_string(),
        })
    }

    pub fn plan_request(&self, row: &[String]) -> Result<PlanRequest, RowError> {
        Ok(PlanRequest::new(
            self.origin(row)?,
            self.destination(row)?,
            self.departure(row)?,
        ))
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
}

fn read_number(row: &[String], column: &(String, usize)) -> Result<f64, RowError> {
    let value = cell(row, column.1);
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| RowError::InvalidNumber {
            column: column.0.clone(),
            value: value.to_string(),
        })
}

fn read_point(
    row: &[String],
    lat: &(String, usize),
    lon: &(String, usize),
) -> Result<GeoPoint, RowError> {
    let point = GeoPoint::new(read_number(row, lat)?, read_number(row, lon)?);
    if !point.is_valid() {
        return Err(RowError::OutOfRange {
            lat: point.lat,
            lon: point.lon,
        });
    }
    Ok(point)
}

/// Parse the timestamp formats found in the trip exports.
///
/// Timestamps with an offset keep their local wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}
