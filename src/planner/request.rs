//! Trip planner request parameters.

use chrono::NaiveDateTime;

use crate::config::PlannerConfig;
use crate::models::GeoPoint;

/// One origin/destination/departure triple to plan
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub departure: NaiveDateTime,
}

impl PlanRequest {
    pub fn new(from: GeoPoint, to: GeoPoint, departure: NaiveDateTime) -> Self {
        Self {
            from,
            to,
            departure,
        }
    }

    /// Query string pairs for a GET against the plan endpoint
    pub fn query_pairs(&self, config: &PlannerConfig) -> Vec<(&'static str, String)> {
        vec![
            ("fromPlace", self.from.to_place_param()),
            ("toPlace", self.to.to_place_param()),
            ("date", self.departure.format("%m-%d-%Y").to_string()),
            ("time", self.departure.format("%-I:%M%P").to_string()),
            ("mode", config.mode.clone()),
            ("arriveBy", config.arrive_by.to_string()),
            ("wheelchair", config.wheelchair.to_string()),
            (
                "showIntermediateStops",
                config.show_intermediate_stops.to_string(),
            ),
            ("locale", config.locale.clone()),
            ("numItineraries", config.num_itineraries.to_string()),
        ]
    }
}
