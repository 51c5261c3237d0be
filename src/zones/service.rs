//! Zone lookup service for classifying points.

use std::sync::Arc;
use tracing::debug;

use super::{load_zone_boundaries, ZoneFields, ZoneIndex};
use crate::error::ZoneError;
use crate::models::{GeoPoint, Zone, ZoneBoundary};

/// Point-in-polygon lookup service over a set of zones
pub struct ZoneService {
    index: ZoneIndex,
}

impl ZoneService {
    /// Create a new lookup service from a spatial index
    pub fn new(index: ZoneIndex) -> Self {
        Self { index }
    }

    /// Load, reproject and index a zone shapefile in one step
    pub fn from_shapefile<P: AsRef<std::path::Path>>(
        path: P,
        fields: &ZoneFields,
        source_crs: Option<&str>,
    ) -> Result<Self, ZoneError> {
        let boundaries = load_zone_boundaries(path, fields, source_crs)?;
        Ok(Self::new(ZoneIndex::build(boundaries)))
    }

    /// Zone containing the point, boundaries included.
    ///
    /// When zones overlap or share an edge the one listed first in the source
    /// file wins. Points outside every zone, including out-of-range
    /// coordinates, yield `None`.
    pub fn lookup(&self, lon: f64, lat: f64) -> Option<Zone> {
        if !GeoPoint::new(lat, lon).is_valid() {
            debug!("Zone lookup at ({}, {}): coordinates out of range", lon, lat);
            return None;
        }

        let found = self.index.first_containing(lon, lat);

        debug!(
            "Zone lookup at ({}, {}): {}",
            lon,
            lat,
            found
                .as_ref()
                .map(|b| b.zone.id.as_str())
                .unwrap_or("no zone")
        );

        found.map(|b| b.zone.clone())
    }

    pub fn lookup_point(&self, point: &GeoPoint) -> Option<Zone> {
        self.lookup(point.lon, point.lat)
    }

    /// All zones covering the point, in file order
    pub fn lookup_all(&self, lon: f64, lat: f64) -> Vec<Arc<ZoneBoundary>> {
        self.index.lookup(lon, lat)
    }

    /// Get the spatial index (for stats/debugging)
    pub fn index(&self) -> &ZoneIndex {
        &self.index
    }
}
