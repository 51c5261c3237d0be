//! Itinerary summary written back onto trip rows.

use serde::{Deserialize, Serialize};

/// Statistics of the fastest itinerary returned for a trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItinerarySummary {
    /// Total itinerary duration in minutes, waiting included
    pub total_duration_min: f64,

    /// Sum of leg distances in kilometers
    pub trip_distance_km: f64,

    /// Time spent on walk legs in minutes
    pub walking_time_min: f64,

    /// Time spent on non-walk legs in minutes
    pub transit_time_min: f64,

    /// Mode transitions between consecutive non-walk legs
    pub mode_changes: u32,

    /// Length of the first walk leg in meters (0 if none)
    pub pickup_proximity_m: f64,

    /// Length of the last walk leg in meters (0 if none)
    pub dropoff_proximity_m: f64,
}

impl ItinerarySummary {
    /// Output column names, in the order of [`ItinerarySummary::to_cells`]
    pub const COLUMNS: [&'static str; 7] = [
        "total_duration_min",
        "trip_distance_km",
        "walking_time_min",
        "transit_time_min",
        "mode_changes",
        "pickup_proximity_m",
        "dropoff_proximity_m",
    ];

    pub fn to_cells(&self) -> [String; 7] {
        [
            self.total_duration_min.to_string(),
            self.trip_distance_km.to_string(),
            self.walking_time_min.to_string(),
            self.transit_time_min.to_string(),
            self.mode_changes.to_string(),
            self.pickup_proximity_m.to_string(),
            self.dropoff_proximity_m.to_string(),
        ]
    }
}

/// Why a trip has no itinerary summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItineraryFailure {
    /// Coordinates or start time of the row could not be read
    InvalidTrip,
    /// Network error, timeout, error status or non-JSON body
    RequestFailed,
    /// The body lacked the expected `plan.itineraries[].legs[]` shape
    MalformedResponse,
    /// The planner answered with an empty itinerary list
    NoItinerary,
}

impl std::fmt::Display for ItineraryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItineraryFailure::InvalidTrip => write!(f, "invalid_trip"),
            ItineraryFailure::RequestFailed => write!(f, "request_failed"),
            ItineraryFailure::MalformedResponse => write!(f, "malformed_response"),
            ItineraryFailure::NoItinerary => write!(f, "no_itinerary"),
        }
    }
}

/// Result of fetching and summarizing one trip
pub type ItineraryOutcome = Result<ItinerarySummary, ItineraryFailure>;
