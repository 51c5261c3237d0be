//! Shape of the trip planner's JSON response.
//!
//! Only the fields the summary needs are modelled; everything else in the
//! body is ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::error::SummaryError;

#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub itineraries: Vec<Itinerary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Itinerary {
    /// Seconds, door to door
    pub duration: f64,
    pub legs: Vec<Leg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Leg {
    pub mode: String,
    /// Seconds
    pub duration: f64,
    /// Meters
    pub distance: f64,
}

impl Leg {
    pub fn is_walk(&self) -> bool {
        self.mode.eq_ignore_ascii_case("walk")
    }
}

/// Extract the `plan` object from a response body
pub fn parse_plan(body: &Value) -> Result<Plan, SummaryError> {
    match body.get("plan") {
        Some(plan) if !plan.is_null() => Ok(Plan::deserialize(plan)?),
        _ => {
            // OTP reports routing failures as `{"error": {"msg": ...}}`
            let message = body
                .get("error")
                .and_then(|e| e.get("msg").or_else(|| e.get("message")))
                .and_then(Value::as_str);
            match message {
                Some(msg) => Err(SummaryError::Planner(msg.to_string())),
                None => Err(SummaryError::MissingPlan),
            }
        }
    }
}
