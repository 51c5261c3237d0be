//! Zone and distance tagging of trip tables.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::TableError;
use crate::models::Zone;
use crate::table::{TripSchema, TripTable};
use crate::zones::ZoneService;

/// Columns appended by [`tag_zones`]
pub const ZONE_COLUMNS: [&str; 5] = [
    "origin_zone_id",
    "origin_zone_name",
    "destination_zone_id",
    "destination_zone_name",
    "haversine_km",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    pub rows: usize,
    pub origins_in_zone: usize,
    pub destinations_in_zone: usize,
    /// Rows whose origin or destination could not be read
    pub invalid_rows: usize,
}

#[derive(Debug, Default)]
struct RowTags {
    origin: Option<Zone>,
    destination: Option<Zone>,
    distance_km: Option<f64>,
    invalid: bool,
}

/// Tag every row with its origin zone, destination zone and haversine distance
pub fn tag_zones(
    service: &ZoneService,
    table: &mut TripTable,
    schema: &TripSchema,
) -> Result<TagReport, TableError> {
    let columns = schema.resolve(table)?;

    info!("Tagging {} trips with zones...", table.len());

    let tags: Vec<RowTags> = table
        .rows()
        .collect::<Vec<_>>()
        .par_iter()
        .enumerate()
        .map(|(row, cells)| {
            let origin = columns.origin(cells);
            let destination = columns.destination(cells);

            if let Err(ref e) = origin {
                warn!("Row {}: {}", row, e);
            }
            if let Err(ref e) = destination {
                warn!("Row {}: {}", row, e);
            }

            RowTags {
                origin: origin.as_ref().ok().and_then(|p| service.lookup_point(p)),
                destination: destination
                    .as_ref()
                    .ok()
                    .and_then(|p| service.lookup_point(p)),
                distance_km: match (&origin, &destination) {
                    (Ok(o), Ok(d)) => Some(o.distance_km(d)),
                    _ => None,
                },
                invalid: origin.is_err() || destination.is_err(),
            }
        })
        .collect();

    let targets: Vec<usize> = ZONE_COLUMNS
        .iter()
        .map(|name| table.ensure_column(name))
        .collect();

    let mut report = TagReport {
        rows: table.len(),
        ..TagReport::default()
    };

    for (row, tag) in tags.into_iter().enumerate() {
        let (origin_id, origin_name) = zone_cells(tag.origin.as_ref());
        let (destination_id, destination_name) = zone_cells(tag.destination.as_ref());

        report.origins_in_zone += usize::from(tag.origin.is_some());
        report.destinations_in_zone += usize::from(tag.destination.is_some());
        report.invalid_rows += usize::from(tag.invalid);

        let values = [
            origin_id,
            origin_name,
            destination_id,
            destination_name,
            tag.distance_km.map(|d| d.to_string()).unwrap_or_default(),
        ];
        for (column, value) in targets.iter().zip(values) {
            table.set(row, *column, value);
        }
    }

    info!(
        "Zone tagging complete: {} origins and {} destinations matched, {} invalid rows",
        report.origins_in_zone, report.destinations_in_zone, report.invalid_rows
    );

    Ok(report)
}

fn zone_cells(zone: Option<&Zone>) -> (String, String) {
    zone.map(|z| (z.id.clone(), z.name.clone()))
        .unwrap_or_default()
}
