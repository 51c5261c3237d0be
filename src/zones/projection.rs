//! Reprojection of zone geometries to WGS84.

use std::path::Path;
use std::sync::OnceLock;

use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::Proj;
use regex::Regex;
use tracing::{debug, info};

use crate::error::ZoneError;

const WGS84: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// WKT root keywords: WKT1 (ESRI/OGC) first, then WKT2
const GEOGRAPHIC_ROOTS: &[&str] = &["GEOGCS", "GEOGCRS", "GEODCRS"];
const PROJECTED_ROOTS: &[&str] = &["PROJCS", "PROJCRS"];

fn utm_zone_regex() -> &'static Regex {
    static UTM_ZONE: OnceLock<Regex> = OnceLock::new();
    UTM_ZONE.get_or_init(|| {
        Regex::new(r"(?i)UTM[ _]?Zone[ _]?(\d{1,2})\s*([NS])?").expect("valid UTM zone regex")
    })
}

fn has_root(wkt: &str, roots: &[&str]) -> bool {
    roots
        .iter()
        .any(|root| wkt.starts_with(root) && wkt[root.len()..].trim_start().starts_with('['))
}

/// Converts coordinates from a source CRS to WGS84 degrees
pub struct Reprojector {
    definition: String,
    from: Proj,
    to: Proj,
}

impl Reprojector {
    /// Build a reprojector from `EPSG:<code>` or a proj4 definition string
    pub fn new(definition: &str) -> Result<Self, ZoneError> {
        let projection_error = |message: String| ZoneError::Projection {
            definition: definition.to_string(),
            message,
        };

        let from = match parse_epsg(definition) {
            Some(code) => Proj::from_epsg_code(code).map_err(|e| projection_error(e.to_string()))?,
            None => Proj::from_proj_string(definition).map_err(|e| projection_error(e.to_string()))?,
        };
        let to = Proj::from_proj_string(WGS84).map_err(|e| projection_error(e.to_string()))?;

        Ok(Self {
            definition: definition.to_string(),
            from,
            to,
        })
    }

    /// Reproject a single coordinate; geographic output is in degrees
    pub fn reproject(&self, coord: Coord<f64>) -> Result<Coord<f64>, ZoneError> {
        // proj4rs works in radians on the geographic side
        let mut point = if self.from.is_latlong() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        proj4rs::transform::transform(&self.from, &self.to, &mut point).map_err(|e| {
            ZoneError::Projection {
                definition: self.definition.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }

    pub fn reproject_geometry(
        &self,
        geometry: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, ZoneError> {
        geometry.try_map_coords(|coord| self.reproject(coord))
    }
}

fn parse_epsg(definition: &str) -> Option<u16> {
    let (authority, code) = definition.trim().split_once(':')?;
    if !authority.eq_ignore_ascii_case("epsg") {
        return None;
    }
    code.trim().parse().ok()
}

/// Decide which CRS the shapefile at `shp_path` is stored in.
///
/// Returns `None` when the data is already geographic and needs no transform.
pub fn resolve_source_crs(
    configured: Option<&str>,
    shp_path: &Path,
) -> Result<Option<String>, ZoneError> {
    if let Some(crs) = configured {
        if parse_epsg(crs) == Some(4326) {
            return Ok(None);
        }
        return Ok(Some(crs.to_string()));
    }

    let prj_path = shp_path.with_extension("prj");
    if !prj_path.exists() {
        debug!(
            "No .prj next to {}, assuming WGS84 coordinates",
            shp_path.display()
        );
        return Ok(None);
    }

    let wkt = std::fs::read_to_string(&prj_path)?;
    let crs = crs_from_prj(&wkt)?;
    if let Some(ref definition) = crs {
        info!("Inferred source CRS from {}: {}", prj_path.display(), definition);
    }
    Ok(crs)
}

/// Map the WKT of an ESRI `.prj` file to a proj4 definition.
///
/// Only geographic CRSes and UTM projections are recognised, in WKT1 or WKT2.
pub fn crs_from_prj(wkt: &str) -> Result<Option<String>, ZoneError> {
    let wkt = wkt.trim();

    if has_root(wkt, GEOGRAPHIC_ROOTS) {
        return Ok(None);
    }

    if !has_root(wkt, PROJECTED_ROOTS) {
        return Err(ZoneError::UnknownCrs(summarize_wkt(wkt)));
    }

    let Some(caps) = utm_zone_regex().captures(wkt) else {
        return Err(ZoneError::UnknownCrs(summarize_wkt(wkt)));
    };

    let zone = &caps[1];
    let south = caps
        .get(2)
        .map(|m| m.as_str().eq_ignore_ascii_case("s"))
        .unwrap_or(false);

    // ETRS89 and NAD83 sit on GRS80; everything else is taken as WGS84
    let upper = wkt.to_ascii_uppercase();
    let ellps = if ["ETRS", "GRS_1980", "GRS 1980", "NAD_1983", "NAD83"]
        .iter()
        .any(|datum| upper.contains(datum))
    {
        "GRS80"
    } else {
        "WGS84"
    };

    let mut definition = format!("+proj=utm +zone={} +ellps={} +units=m +no_defs", zone, ellps);
    if south {
        definition.push_str(" +south");
    }
    Ok(Some(definition))
}

fn summarize_wkt(wkt: &str) -> String {
    wkt.chars().take(60).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETRS89_UTM32: &str = r#"PROJCS["ETRS_1989_UTM_Zone_32N",GEOGCS["GCS_ETRS_1989",DATUM["D_ETRS_1989",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",9.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    #[test]
    fn test_prj_utm_zone() {
        let crs = crs_from_prj(ETRS89_UTM32).unwrap().unwrap();
        assert_eq!(crs, "+proj=utm +zone=32 +ellps=GRS80 +units=m +no_defs");
    }

    #[test]
    fn test_prj_wkt2_utm_zone() {
        let wkt = r#"PROJCRS["ETRS89 / UTM zone 33N",BASEGEOGCRS["ETRS89",DATUM["European Terrestrial Reference System 1989",ELLIPSOID["GRS 1980",6378137,298.257222101]]],CONVERSION["UTM zone 33N",METHOD["Transverse Mercator"]],ID["EPSG",25833]]"#;
        let crs = crs_from_prj(wkt).unwrap().unwrap();
        assert_eq!(crs, "+proj=utm +zone=33 +ellps=GRS80 +units=m +no_defs");
    }

    #[test]
    fn test_prj_wkt2_geographic() {
        let wkt = r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563]],ID["EPSG",4326]]"#;
        assert!(crs_from_prj(wkt).unwrap().is_none());
    }

    #[test]
    fn test_prj_southern_wgs84_utm() {
        let wkt = r#"PROJCS["WGS_1984_UTM_Zone_23S",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]]]]"#;
        let crs = crs_from_prj(wkt).unwrap().unwrap();
        assert_eq!(crs, "+proj=utm +zone=23 +ellps=WGS84 +units=m +no_defs +south");
    }

    #[test]
    fn test_prj_geographic() {
        let wkt = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]]]"#;
        assert!(crs_from_prj(wkt).unwrap().is_none());
    }

    #[test]
    fn test_prj_unknown_projection() {
        let wkt = r#"PROJCS["Lambert_Conformal_Conic",GEOGCS["GCS_WGS_1984"]]"#;
        assert!(matches!(crs_from_prj(wkt), Err(ZoneError::UnknownCrs(_))));
    }

    #[test]
    fn test_configured_epsg_4326_is_identity() {
        let resolved = resolve_source_crs(Some("EPSG:4326"), Path::new("zones.shp")).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_utm_to_wgs84_lands_in_copenhagen() {
        let reprojector = Reprojector::new("+proj=utm +zone=32 +ellps=GRS80 +units=m +no_defs").unwrap();
        let coord = reprojector
            .reproject(Coord {
                x: 724_000.0,
                y: 6_175_000.0,
            })
            .unwrap();
        assert!((12.3..12.9).contains(&coord.x), "lon {}", coord.x);
        assert!((55.4..55.9).contains(&coord.y), "lat {}", coord.y);
    }

    #[test]
    fn test_epsg_code_parsing() {
        assert_eq!(parse_epsg("EPSG:25832"), Some(25832));
        assert_eq!(parse_epsg("epsg: 4326"), Some(4326));
        assert_eq!(parse_epsg("+proj=utm +zone=32"), None);
    }
}
