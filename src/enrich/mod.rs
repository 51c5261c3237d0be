//! Enrichment of trip tables with itinerary statistics and zone tags.
//!
//! Both passes compute per-row results first and write them into the table
//! in a single sequential loop afterwards.

mod itineraries;
mod zones;

use indicatif::{ProgressBar, ProgressStyle};

pub use itineraries::{
    enrich_itineraries, fetch_summary, write_outcomes, BatchOptions, BatchReport, STATUS_COLUMN,
};
pub use zones::{tag_zones, TagReport, ZONE_COLUMNS};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})";

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
