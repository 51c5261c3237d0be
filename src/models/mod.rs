//! Core data models shared by the zone, distance and itinerary modules.

pub mod itinerary;
pub mod point;
pub mod zone;

pub use itinerary::{ItineraryFailure, ItineraryOutcome, ItinerarySummary};
pub use point::GeoPoint;
pub use zone::{Zone, ZoneBoundary};
