//! Zone lookup against analysis-zone shapefiles.
//!
//! Zone polygons are read once, reprojected to WGS84 and kept in an R-tree
//! for point-in-polygon queries.

mod index;
mod loader;
mod projection;
mod service;

pub use index::ZoneIndex;
pub use loader::{load_zone_boundaries, zone_from_shape, ZoneFields};
pub use projection::{crs_from_prj, resolve_source_crs, Reprojector};
pub use service::ZoneService;
