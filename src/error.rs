//! Error types for the library modules.
//!
//! The binary wraps these in `anyhow` with context; per-row failures inside
//! a batch are never surfaced as errors but as an explicit
//! [`ItineraryFailure`](crate::models::ItineraryFailure).

use thiserror::Error;

/// Errors raised while loading and reprojecting zone shapefiles
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("failed reading shapefile '{path}': {message}")]
    Read { path: String, message: String },

    #[error("feature {index} has shape type {shape_type}, expected a polygon")]
    NotPolygonal { index: usize, shape_type: String },

    #[error("feature {index} has an invalid polygon: {message}")]
    Geometry { index: usize, message: String },

    #[error("feature {index} is missing attribute field '{field}'")]
    MissingField { index: usize, field: String },

    #[error("invalid projection '{definition}': {message}")]
    Projection { definition: String, message: String },

    #[error("cannot infer a projection from the .prj file ({0}); set zones.source_crs")]
    UnknownCrs(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Request-level errors talking to the trip planner
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid planner url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("planner returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("planner returned a non-JSON body: {0}")]
    Body(String),
}

/// Response-shape errors while summarizing a plan
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("response has no plan")]
    MissingPlan,

    #[error("planner reported an error instead of a plan: {0}")]
    Planner(String),

    #[error("malformed plan: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("plan contains no itineraries")]
    NoItineraries,
}

/// Errors reading or writing the trip table
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("column '{0}' not found in table header")]
    MissingColumn(String),

    #[error("row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Why a single row could not be turned into a trip
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("column '{column}' holds '{value}', expected a number")]
    InvalidNumber { column: String, value: String },

    #[error("column '{column}' holds '{value}', expected a timestamp")]
    InvalidTimestamp { column: String, value: String },

    #[error("coordinates ({lat}, {lon}) are out of range")]
    OutOfRange { lat: f64, lon: f64 },
}
