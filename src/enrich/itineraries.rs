//! Concurrent itinerary fetching over a whole trip table.

use std::collections::{BTreeMap, HashMap};

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::progress_bar;
use crate::config::PlannerConfig;
use crate::error::{SummaryError, TableError};
use crate::models::{ItineraryFailure, ItineraryOutcome, ItinerarySummary};
use crate::planner::{summarize_response, ItineraryPlanner, PlanRequest};
use crate::table::{TripSchema, TripTable};

/// Column naming the outcome of each row (`ok` or a failure kind)
pub const STATUS_COLUMN: &str = "itinerary_status";

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of planner requests in flight
    pub concurrency: usize,
    pub show_progress: bool,
}

impl BatchOptions {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            show_progress: true,
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&PlannerConfig::default())
    }
}

/// Counts of what happened to the rows of one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub rows: usize,
    pub succeeded: usize,
    pub failures: BTreeMap<ItineraryFailure, usize>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failures.values().sum()
    }

    pub fn count(&self, failure: ItineraryFailure) -> usize {
        self.failures.get(&failure).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} rows, {} with itineraries", self.rows, self.succeeded)?;
        for (failure, count) in &self.failures {
            write!(f, ", {} {}", count, failure)?;
        }
        Ok(())
    }
}

/// Fetch and summarize one trip; every error becomes a failure outcome
pub async fn fetch_summary<P: ItineraryPlanner>(
    planner: &P,
    row: usize,
    request: &PlanRequest,
) -> ItineraryOutcome {
    match planner.plan(request).await {
        Ok(body) => summarize_body(row, &body),
        Err(e) => {
            warn!("Row {}: planner request failed: {}", row, e);
            Err(ItineraryFailure::RequestFailed)
        }
    }
}

fn summarize_body(row: usize, body: &Value) -> ItineraryOutcome {
    match summarize_response(body) {
        Ok(summary) => {
            debug!(
                "Row {}: {:.1} min, {} mode changes",
                row, summary.total_duration_min, summary.mode_changes
            );
            Ok(summary)
        }
        Err(e @ (SummaryError::NoItineraries | SummaryError::Planner(_))) => {
            warn!("Row {}: {}", row, e);
            Err(ItineraryFailure::NoItinerary)
        }
        Err(e) => {
            warn!("Row {}: {}", row, e);
            Err(ItineraryFailure::MalformedResponse)
        }
    }
}

/// Fetch itineraries for every row and append the summary columns.
///
/// Requests run concurrently up to `options.concurrency`; results are merged
/// into the table only after all of them have finished. A failing row never
/// affects another row.
pub async fn enrich_itineraries<P: ItineraryPlanner>(
    planner: &P,
    table: &mut TripTable,
    schema: &TripSchema,
    options: &BatchOptions,
) -> Result<BatchReport, TableError> {
    let columns = schema.resolve(table)?;

    let mut outcomes: HashMap<usize, ItineraryOutcome> = HashMap::with_capacity(table.len());
    let mut requests = Vec::with_capacity(table.len());

    for (row, cells) in table.rows().enumerate() {
        match columns.plan_request(cells) {
            Ok(request) => requests.push((row, request)),
            Err(e) => {
                warn!("Row {}: {}", row, e);
                outcomes.insert(row, Err(ItineraryFailure::InvalidTrip));
            }
        }
    }

    let concurrency = options.concurrency.max(1);
    info!(
        "Fetching itineraries for {} trips ({} in flight)",
        requests.len(),
        concurrency
    );

    let pb = progress_bar(requests.len() as u64, options.show_progress);

    let mut results = stream::iter(requests)
        .map(|(row, request)| async move {
            let outcome = fetch_summary(planner, row, &request).await;
            (row, outcome)
        })
        .buffer_unordered(concurrency);

    // Completion order, not submission order
    while let Some((row, outcome)) = results.next().await {
        outcomes.insert(row, outcome);
        pb.inc(1);
    }

    pb.finish_with_message("Itineraries fetched");

    let report = write_outcomes(table, &outcomes);
    info!("Itinerary batch complete: {}", report);
    Ok(report)
}

/// Merge per-row outcomes into the table by row index
pub fn write_outcomes(
    table: &mut TripTable,
    outcomes: &HashMap<usize, ItineraryOutcome>,
) -> BatchReport {
    let summary_columns: Vec<usize> = ItinerarySummary::COLUMNS
        .iter()
        .map(|name| table.ensure_column(name))
        .collect();
    let status_column = table.ensure_column(STATUS_COLUMN);

    let mut report = BatchReport {
        rows: table.len(),
        ..BatchReport::default()
    };

    for row in 0..table.len() {
        let outcome = outcomes.get(&row).copied().unwrap_or_else(|| {
            warn!("Row {}: no outcome recorded", row);
            Err(ItineraryFailure::RequestFailed)
        });

        match outcome {
            Ok(summary) => {
                for (column, value) in summary_columns.iter().zip(summary.to_cells()) {
                    table.set(row, *column, value);
                }
                table.set(row, status_column, "ok".to_string());
                report.succeeded += 1;
            }
            Err(failure) => {
                for column in &summary_columns {
                    table.set(row, *column, String::new());
                }
                table.set(row, status_column, failure.to_string());
                *report.failures.entry(failure).or_default() += 1;
            }
        }
    }

    report
}
