//! Trip planner requests and itinerary summaries.
//!
//! [`ItineraryPlanner`] is the seam between the batch runner and the HTTP
//! transport; [`summarize_response`] turns a raw plan body into an
//! [`ItinerarySummary`](crate::models::ItinerarySummary).

mod client;
mod request;
mod response;
mod summary;

use std::future::Future;

use serde_json::Value;

use crate::error::PlanError;

pub use client::TripPlannerClient;
pub use request::PlanRequest;
pub use response::{parse_plan, Itinerary, Leg, Plan};
pub use summary::{select_fastest, summarize_itinerary, summarize_response};

/// Something that can answer plan requests with a raw JSON body
pub trait ItineraryPlanner {
    fn plan(
        &self,
        request: &PlanRequest,
    ) -> impl Future<Output = Result<Value, PlanError>> + Send;
}
