//! Analysis zone types for point-in-polygon lookup.

use geo::{BoundingRect, MultiPolygon};
use serde::{Deserialize, Serialize};

/// Descriptive attributes of a zone as found in the source shapefile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier (`zoneID`)
    pub id: String,

    /// Zone name (`zoneName`)
    pub name: String,

    /// Free-form description (`zoneDescription`)
    pub description: String,
}

/// A zone polygon in WGS84 together with its attributes
#[derive(Debug, Clone)]
pub struct ZoneBoundary {
    pub zone: Zone,
    pub geometry: MultiPolygon<f64>,
    /// Position of the feature in the source file
    pub order: usize,
}

impl ZoneBoundary {
    /// Get the bounding box of this boundary
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}
