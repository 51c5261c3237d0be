//! Spatial index for fast zone lookups.

use geo::{Intersects, Point};
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::info;

use crate::models::ZoneBoundary;

/// Wrapper for R-tree indexing of zone boundaries
#[derive(Clone)]
pub struct IndexedZone {
    pub boundary: Arc<ZoneBoundary>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedZone {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedZone {
    pub fn new(boundary: ZoneBoundary) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = boundary.bbox()?;
        Some(Self {
            boundary: Arc::new(boundary),
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// Spatial index for zone boundaries using R-tree
pub struct ZoneIndex {
    tree: RTree<IndexedZone>,
}

impl ZoneIndex {
    /// Build spatial index from zone boundaries
    pub fn build(boundaries: Vec<ZoneBoundary>) -> Self {
        info!("Building spatial index for {} zones...", boundaries.len());

        // Empty geometries have no bounding box and can never match
        let indexed: Vec<IndexedZone> = boundaries
            .into_iter()
            .filter_map(IndexedZone::new)
            .collect();

        let tree = RTree::bulk_load(indexed);

        info!("Spatial index built with {} entries", tree.size());

        Self { tree }
    }

    /// Find all zones whose polygon contains or touches a point, in file order
    pub fn lookup(&self, lon: f64, lat: f64) -> Vec<Arc<ZoneBoundary>> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        // Use R-tree to get candidates via envelope intersection, then filter with exact test
        let mut hits: Vec<Arc<ZoneBoundary>> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|iz| iz.boundary.geometry.intersects(&point))
            .map(|iz| Arc::clone(&iz.boundary))
            .collect();

        hits.sort_by_key(|b| b.order);
        hits
    }

    /// First zone in file order containing the point
    pub fn first_containing(&self, lon: f64, lat: f64) -> Option<Arc<ZoneBoundary>> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|iz| iz.boundary.geometry.intersects(&point))
            .min_by_key(|iz| iz.boundary.order)
            .map(|iz| Arc::clone(&iz.boundary))
    }

    /// Get total number of indexed zones
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
