//! Zone extraction from polygon shapefiles.

use std::path::Path;

use geo::MultiPolygon;
use shapefile::dbase::{FieldValue, Record};
use shapefile::Shape;
use tracing::{debug, info};

use super::projection::{resolve_source_crs, Reprojector};
use crate::error::ZoneError;
use crate::models::{Zone, ZoneBoundary};

/// Names of the attribute fields carrying zone metadata
#[derive(Debug, Clone)]
pub struct ZoneFields {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Default for ZoneFields {
    fn default() -> Self {
        Self {
            id: "zoneID".to_string(),
            name: "zoneName".to_string(),
            description: "zoneDescription".to_string(),
        }
    }
}

/// Read every zone of a shapefile and reproject it to WGS84.
///
/// `source_crs` overrides the CRS found in the `.prj` sidecar.
pub fn load_zone_boundaries<P: AsRef<Path>>(
    path: P,
    fields: &ZoneFields,
    source_crs: Option<&str>,
) -> Result<Vec<ZoneBoundary>, ZoneError> {
    let path = path.as_ref();
    info!("Loading zones from {}", path.display());

    let crs = resolve_source_crs(source_crs, path)?;
    let reprojector = crs.as_deref().map(Reprojector::new).transpose()?;

    let rows = shapefile::read(path).map_err(|e| ZoneError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut boundaries = Vec::with_capacity(rows.len());
    for (index, (shape, record)) in rows.into_iter().enumerate() {
        let mut boundary = zone_from_shape(index, shape, &record, fields)?;
        if let Some(ref reprojector) = reprojector {
            boundary.geometry = reprojector.reproject_geometry(&boundary.geometry)?;
        }
        boundaries.push(boundary);
    }

    info!(
        "Loaded {} zones{}",
        boundaries.len(),
        if reprojector.is_some() {
            " (reprojected to WGS84)"
        } else {
            ""
        }
    );

    Ok(boundaries)
}

/// Build a zone from one shapefile feature, without reprojection
pub fn zone_from_shape(
    index: usize,
    shape: Shape,
    record: &Record,
    fields: &ZoneFields,
) -> Result<ZoneBoundary, ZoneError> {
    let geometry: MultiPolygon<f64> = match shape {
        Shape::Polygon(polygon) => {
            MultiPolygon::<f64>::try_from(polygon).map_err(|e| ZoneError::Geometry {
                index,
                message: e.to_string(),
            })?
        }
        Shape::PolygonM(polygon) => {
            MultiPolygon::<f64>::try_from(polygon).map_err(|e| ZoneError::Geometry {
                index,
                message: e.to_string(),
            })?
        }
        // Z and M values are dropped; lookups are planar
        Shape::PolygonZ(polygon) => {
            MultiPolygon::<f64>::try_from(polygon).map_err(|e| ZoneError::Geometry {
                index,
                message: e.to_string(),
            })?
        }
        other => {
            return Err(ZoneError::NotPolygonal {
                index,
                shape_type: other.shapetype().to_string(),
            })
        }
    };

    let zone = Zone {
        id: read_field(index, record, &fields.id)?,
        name: read_field(index, record, &fields.name)?,
        description: read_field(index, record, &fields.description)?,
    };

    debug!("Zone {} '{}' at feature {}", zone.id, zone.name, index);

    Ok(ZoneBoundary {
        zone,
        geometry,
        order: index,
    })
}

fn read_field(index: usize, record: &Record, field: &str) -> Result<String, ZoneError> {
    let value = record.get(field).ok_or_else(|| ZoneError::MissingField {
        index,
        field: field.to_string(),
    })?;
    Ok(field_to_string(value))
}

/// Render a dbase value as text; null values become empty strings
fn field_to_string(value: &FieldValue) -> String {
    match value {
        FieldValue::Character(s) => s.as_deref().unwrap_or("").trim().to_string(),
        FieldValue::Memo(s) => s.trim().to_string(),
        FieldValue::Numeric(n) => n.map(format_number).unwrap_or_default(),
        FieldValue::Float(n) => n.map(|v| format_number(v as f64)).unwrap_or_default(),
        FieldValue::Double(n) => format_number(*n),
        FieldValue::Currency(n) => format_number(*n),
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::Logical(b) => b.map(|v| v.to_string()).unwrap_or_default(),
        other => format!("{:?}", other),
    }
}

/// Integral values lose their decimal part, so `101011.0` reads as `101011`
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneService;
    use geo::{Contains, Point};
    use shapefile::dbase::{FieldName, TableWriterBuilder};

    const ETRS89_UTM32_PRJ: &str = r#"PROJCS["ETRS_1989_UTM_Zone_32N",GEOGCS["GCS_ETRS_1989",DATUM["D_ETRS_1989",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",9.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    // Copenhagen city hall square (12.5683, 55.6761) sits at about
    // E 724352 / N 6175804 in ETRS89 / UTM 32N
    const COPENHAGEN: (f64, f64) = (12.5683, 55.6761);

    fn zone_table() -> TableWriterBuilder {
        TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("zoneID").unwrap(), 20)
            .add_character_field(FieldName::try_from("zoneName").unwrap(), 50)
            .add_character_field(FieldName::try_from("zoneDescription").unwrap(), 80)
    }

    fn utm_ring(min_e: f64, min_n: f64, max_e: f64, max_n: f64) -> Vec<shapefile::Point> {
        vec![
            shapefile::Point::new(min_e, min_n),
            shapefile::Point::new(min_e, max_n),
            shapefile::Point::new(max_e, max_n),
            shapefile::Point::new(max_e, min_n),
            shapefile::Point::new(min_e, min_n),
        ]
    }

    fn named_record(id: &str, name: &str) -> Record {
        let mut record = Record::default();
        record.insert(
            "zoneID".to_string(),
            FieldValue::Character(Some(id.to_string())),
        );
        record.insert(
            "zoneName".to_string(),
            FieldValue::Character(Some(name.to_string())),
        );
        record.insert(
            "zoneDescription".to_string(),
            FieldValue::Character(Some(String::new())),
        );
        record
    }

    fn square_shape(min: f64, max: f64) -> Shape {
        let ring = vec![
            shapefile::Point::new(min, min),
            shapefile::Point::new(min, max),
            shapefile::Point::new(max, max),
            shapefile::Point::new(max, min),
            shapefile::Point::new(min, min),
        ];
        Shape::Polygon(shapefile::Polygon::new(shapefile::PolygonRing::Outer(ring)))
    }

    fn record(id: FieldValue) -> Record {
        let mut record = Record::default();
        record.insert("zoneID".to_string(), id);
        record.insert(
            "zoneName".to_string(),
            FieldValue::Character(Some("Indre By".to_string())),
        );
        record.insert(
            "zoneDescription".to_string(),
            FieldValue::Character(Some("Copenhagen centre ".to_string())),
        );
        record
    }

    #[test]
    fn test_zone_from_polygon() {
        let boundary = zone_from_shape(
            3,
            square_shape(0.0, 1.0),
            &record(FieldValue::Numeric(Some(101011.0))),
            &ZoneFields::default(),
        )
        .unwrap();

        assert_eq!(boundary.zone.id, "101011");
        assert_eq!(boundary.zone.name, "Indre By");
        assert_eq!(boundary.zone.description, "Copenhagen centre");
        assert_eq!(boundary.order, 3);
        assert!(boundary.geometry.contains(&Point::new(0.5, 0.5)));
    }

    #[test]
    fn test_missing_field_is_reported() {
        let fields = ZoneFields {
            id: "ZONE_NR".to_string(),
            ..ZoneFields::default()
        };
        let err = zone_from_shape(
            0,
            square_shape(0.0, 1.0),
            &record(FieldValue::Character(Some("1".to_string()))),
            &fields,
        )
        .unwrap_err();
        assert!(matches!(err, ZoneError::MissingField { ref field, .. } if field == "ZONE_NR"));
    }

    #[test]
    fn test_point_shape_is_rejected() {
        let err = zone_from_shape(
            7,
            Shape::Point(shapefile::Point::new(0.0, 0.0)),
            &record(FieldValue::Character(Some("1".to_string()))),
            &ZoneFields::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ZoneError::NotPolygonal { index: 7, .. }));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(101011.0), "101011");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_polygon_z_feature() {
        let ring = vec![
            shapefile::PointZ::new(0.0, 0.0, 12.0, 0.0),
            shapefile::PointZ::new(0.0, 1.0, 12.0, 0.0),
            shapefile::PointZ::new(1.0, 1.0, 14.0, 0.0),
            shapefile::PointZ::new(1.0, 0.0, 14.0, 0.0),
            shapefile::PointZ::new(0.0, 0.0, 12.0, 0.0),
        ];
        let shape = Shape::PolygonZ(shapefile::PolygonZ::new(shapefile::PolygonRing::Outer(ring)));

        let boundary = zone_from_shape(
            0,
            shape,
            &record(FieldValue::Character(Some("101011".to_string()))),
            &ZoneFields::default(),
        )
        .unwrap();
        assert!(boundary.geometry.contains(&Point::new(0.5, 0.5)));
    }

    #[test]
    fn test_load_polygon_z_file_with_configured_crs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones_3d.shp");
        {
            let ring = utm_ring(720_000.0, 6_170_000.0, 729_000.0, 6_180_000.0)
                .into_iter()
                .map(|p| shapefile::PointZ::new(p.x, p.y, 5.0, 0.0))
                .collect();
            let polygon = shapefile::PolygonZ::new(shapefile::PolygonRing::Outer(ring));
            let mut writer = shapefile::Writer::from_path(&path, zone_table()).unwrap();
            writer
                .write_shape_and_record(&polygon, &named_record("101011", "Indre By"))
                .unwrap();
        }

        let boundaries =
            load_zone_boundaries(&path, &ZoneFields::default(), Some("EPSG:25832")).unwrap();
        assert_eq!(boundaries.len(), 1);
        assert!(boundaries[0]
            .geometry
            .contains(&Point::new(COPENHAGEN.0, COPENHAGEN.1)));
    }

    #[test]
    fn test_load_reprojects_from_prj_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.shp");
        {
            let mut writer = shapefile::Writer::from_path(&path, zone_table()).unwrap();
            // Listed first but nowhere near the city centre
            let west = shapefile::Polygon::new(shapefile::PolygonRing::Outer(utm_ring(
                700_000.0,
                6_170_000.0,
                710_000.0,
                6_180_000.0,
            )));
            let centre = shapefile::Polygon::new(shapefile::PolygonRing::Outer(utm_ring(
                720_000.0,
                6_170_000.0,
                729_000.0,
                6_180_000.0,
            )));
            writer
                .write_shape_and_record(&west, &named_record("147001", "Roskilde"))
                .unwrap();
            writer
                .write_shape_and_record(&centre, &named_record("101011", "Indre By"))
                .unwrap();
        }
        std::fs::write(path.with_extension("prj"), ETRS89_UTM32_PRJ).unwrap();

        let boundaries = load_zone_boundaries(&path, &ZoneFields::default(), None).unwrap();
        assert_eq!(boundaries.len(), 2);
        assert_eq!(boundaries[0].zone.id, "147001");
        assert_eq!(boundaries[0].order, 0);
        assert_eq!(boundaries[1].zone.id, "101011");
        assert_eq!(boundaries[1].order, 1);

        // Every vertex now reads as degrees around Zealand
        let (min_x, min_y, max_x, max_y) = boundaries[1].bbox().unwrap();
        assert!(min_x > 12.0 && max_x < 13.0, "lon {}..{}", min_x, max_x);
        assert!(min_y > 55.0 && max_y < 56.0, "lat {}..{}", min_y, max_y);

        let service = ZoneService::from_shapefile(&path, &ZoneFields::default(), None).unwrap();
        let zone = service.lookup(COPENHAGEN.0, COPENHAGEN.1).unwrap();
        assert_eq!(zone.id, "101011");
        assert_eq!(zone.name, "Indre By");
        assert!(service.lookup(10.0, 50.0).is_none());
    }
}
