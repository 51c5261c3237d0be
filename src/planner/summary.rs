//! Fastest-itinerary selection and summary statistics.

use serde_json::Value;

use super::response::{parse_plan, Itinerary};
use crate::error::SummaryError;
use crate::models::ItinerarySummary;

/// The itinerary with the smallest duration; ties keep the first one listed
pub fn select_fastest(itineraries: &[Itinerary]) -> Option<&Itinerary> {
    itineraries
        .iter()
        .min_by(|a, b| a.duration.total_cmp(&b.duration))
}

/// Summary statistics of a single itinerary
pub fn summarize_itinerary(itinerary: &Itinerary) -> ItinerarySummary {
    let mut distance_m = 0.0;
    let mut walking_s = 0.0;
    let mut transit_s = 0.0;
    let mut first_walk_m = None;
    let mut last_walk_m = None;
    let mut mode_changes = 0;
    let mut previous_mode: Option<&str> = None;

    for leg in &itinerary.legs {
        distance_m += leg.distance;

        if leg.is_walk() {
            walking_s += leg.duration;
            first_walk_m.get_or_insert(leg.distance);
            last_walk_m = Some(leg.distance);
            continue;
        }

        transit_s += leg.duration;
        if let Some(prev) = previous_mode {
            if prev != leg.mode {
                mode_changes += 1;
            }
        }
        previous_mode = Some(leg.mode.as_str());
    }

    ItinerarySummary {
        total_duration_min: itinerary.duration / 60.0,
        trip_distance_km: distance_m / 1000.0,
        walking_time_min: walking_s / 60.0,
        transit_time_min: transit_s / 60.0,
        mode_changes,
        pickup_proximity_m: first_walk_m.unwrap_or(0.0),
        dropoff_proximity_m: last_walk_m.unwrap_or(0.0),
    }
}

/// Parse a planner response and summarize its fastest itinerary
pub fn summarize_response(body: &Value) -> Result<ItinerarySummary, SummaryError> {
    let plan = parse_plan(body)?;
    let fastest = select_fastest(&plan.itineraries).ok_or(SummaryError::NoItineraries)?;
    Ok(summarize_itinerary(fastest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn itinerary(duration: f64, legs: Value) -> Value {
        json!({ "duration": duration, "legs": legs })
    }

    #[test]
    fn test_fastest_is_selected() {
        let body = json!({"plan": {"itineraries": [
            itinerary(900.0, json!([{"mode": "BUS", "duration": 900, "distance": 5000}])),
            itinerary(600.0, json!([{"mode": "RAIL", "duration": 600, "distance": 7000}])),
        ]}});
        let summary = summarize_response(&body).unwrap();
        assert_eq!(summary.total_duration_min, 10.0);
        assert_eq!(summary.trip_distance_km, 7.0);
    }

    #[test]
    fn test_tie_keeps_first() {
        let plan = parse_plan(&json!({"plan": {"itineraries": [
            itinerary(600.0, json!([{"mode": "BUS", "duration": 600, "distance": 1000}])),
            itinerary(600.0, json!([{"mode": "RAIL", "duration": 600, "distance": 2000}])),
        ]}}))
        .unwrap();
        let fastest = select_fastest(&plan.itineraries).unwrap();
        assert_eq!(fastest.legs[0].mode, "BUS");
    }

    #[test]
    fn test_walk_bus_walk() {
        let body = json!({"plan": {"itineraries": [itinerary(780.0, json!([
            {"mode": "WALK", "duration": 120, "distance": 100},
            {"mode": "BUS", "duration": 600, "distance": 3000},
            {"mode": "WALK", "duration": 60, "distance": 80},
        ]))]}});
        let summary = summarize_response(&body).unwrap();

        assert_eq!(summary.total_duration_min, 13.0);
        assert_eq!(summary.walking_time_min, 3.0);
        assert_eq!(summary.transit_time_min, 10.0);
        assert_eq!(summary.pickup_proximity_m, 100.0);
        assert_eq!(summary.dropoff_proximity_m, 80.0);
        assert_eq!(summary.mode_changes, 0);
        assert!((summary.trip_distance_km - 3.18).abs() < 1e-9);
    }

    #[test]
    fn test_mode_changes_skip_walk_legs() {
        let body = json!({"plan": {"itineraries": [itinerary(3000.0, json!([
            {"mode": "BUS", "duration": 600, "distance": 3000},
            {"mode": "WALK", "duration": 120, "distance": 150},
            {"mode": "BUS", "duration": 600, "distance": 3000},
            {"mode": "RAIL", "duration": 900, "distance": 12000},
            {"mode": "SUBWAY", "duration": 300, "distance": 2500},
        ]))]}});
        let summary = summarize_response(&body).unwrap();
        assert_eq!(summary.mode_changes, 2);
        assert_eq!(summary.pickup_proximity_m, 150.0);
        assert_eq!(summary.dropoff_proximity_m, 150.0);
    }

    #[test]
    fn test_no_walk_legs() {
        let body = json!({"plan": {"itineraries": [itinerary(600.0, json!([
            {"mode": "RAIL", "duration": 600, "distance": 9000},
        ]))]}});
        let summary = summarize_response(&body).unwrap();
        assert_eq!(summary.pickup_proximity_m, 0.0);
        assert_eq!(summary.dropoff_proximity_m, 0.0);
        assert_eq!(summary.walking_time_min, 0.0);
    }

    #[test]
    fn test_missing_plan() {
        let body = json!({"requestParameters": {"fromPlace": "55.6,12.5"}});
        assert!(matches!(
            summarize_response(&body),
            Err(SummaryError::MissingPlan)
        ));
    }

    #[test]
    fn test_empty_itineraries() {
        let body = json!({"plan": {"itineraries": []}});
        assert!(matches!(
            summarize_response(&body),
            Err(SummaryError::NoItineraries)
        ));
    }
}
