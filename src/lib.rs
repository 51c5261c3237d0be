//! tripstat - trip enrichment tools for mobility studies
//!
//! This library provides zone lookup against analysis-zone shapefiles,
//! great-circle distances, and concurrent itinerary statistics from a
//! trip-planning service, all applied to CSV trip tables.

pub mod config;
pub mod distance;
pub mod enrich;
pub mod error;
pub mod models;
pub mod planner;
pub mod table;
pub mod zones;

pub use models::{GeoPoint, ItineraryFailure, ItineraryOutcome, ItinerarySummary, Zone};
