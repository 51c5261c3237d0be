//! HTTP client for an OpenTripPlanner-style plan endpoint.

use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ItineraryPlanner, PlanRequest};
use crate::config::PlannerConfig;
use crate::error::PlanError;

const USER_AGENT: &str = concat!("tripstat/", env!("CARGO_PKG_VERSION"));

/// Error bodies are cut to this many characters before being logged
const MAX_ERROR_BODY: usize = 200;

/// Fetches trip plans over HTTP
#[derive(Clone)]
pub struct TripPlannerClient {
    client: Client,
    endpoint: Url,
    config: PlannerConfig,
}

impl TripPlannerClient {
    pub fn new(config: PlannerConfig) -> Result<Self, PlanError> {
        let endpoint = config.endpoint()?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Full GET url for a request
    pub fn request_url(&self, request: &PlanRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(request.query_pairs(&self.config));
        url
    }

    /// Issue the request and parse the body as JSON
    pub async fn fetch_plan(&self, request: &PlanRequest) -> Result<Value, PlanError> {
        let url = self.request_url(request);
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PlanError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| PlanError::Body(e.to_string()))
    }
}

impl ItineraryPlanner for TripPlannerClient {
    async fn plan(&self, request: &PlanRequest) -> Result<Value, PlanError> {
        self.fetch_plan(request).await
    }
}
