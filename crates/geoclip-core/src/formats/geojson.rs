//! GeoJSON reading and writing, plus boundary parsing

use std::fs;
use std::path::{Path, PathBuf};

use geo::{Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde_json::{json, Value};

use crate::error::{GeoclipError, Result};
use crate::formats::{FormatReader, FormatWriter};
use crate::models::{Boundary, Crs, VectorDataset, VectorFeature};

/// GeoJSON format (FeatureCollection files)
pub struct GeoJsonFormat;

impl FormatReader for GeoJsonFormat {
    fn read(&self, path: &Path) -> Result<VectorDataset> {
        let content = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        parse_dataset(&content, name)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

impl FormatWriter for GeoJsonFormat {
    fn write(&self, dataset: &VectorDataset, path: &Path) -> Result<Vec<PathBuf>> {
        let text = to_feature_collection_string(dataset)?;
        fs::write(path, text)?;
        Ok(vec![path.to_path_buf()])
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

/// Parse a request boundary.
///
/// Accepts a FeatureCollection, a Feature or a bare Geometry. Every Polygon
/// and MultiPolygon found (including inside GeometryCollections) is merged
/// into a single MultiPolygon; other geometry types are ignored.
pub fn parse_boundary(value: &Value) -> Result<Boundary> {
    let geojson = GeoJson::from_json_value(value.clone())
        .map_err(|e| GeoclipError::input(format!("boundary is not valid GeoJSON: {}", e)))?;

    let (geometries, crs) = match &geojson {
        GeoJson::FeatureCollection(fc) => {
            let geometries: Vec<&geojson::Geometry> =
                fc.features.iter().filter_map(|f| f.geometry.as_ref()).collect();
            (geometries, extract_crs(fc.foreign_members.as_ref()))
        }
        GeoJson::Feature(feature) => (
            feature.geometry.iter().collect(),
            extract_crs(feature.foreign_members.as_ref()),
        ),
        GeoJson::Geometry(geometry) => (vec![geometry], extract_crs(geometry.foreign_members.as_ref())),
    };

    let mut polygons = Vec::new();
    for geometry in geometries {
        let converted = Geometry::<f64>::try_from(&geometry.value).map_err(|e| {
            GeoclipError::input(format!("boundary geometry cannot be converted: {}", e))
        })?;
        collect_polygons(converted, &mut polygons);
    }

    if polygons.is_empty() {
        return Err(GeoclipError::input("boundary contains no Polygon or MultiPolygon geometry"));
    }

    Ok(Boundary::new(MultiPolygon::new(polygons), crs.unwrap_or_else(Crs::wgs84)))
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<geo::Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(polygon) => out.push(polygon),
        Geometry::MultiPolygon(multi) => out.extend(multi.0),
        Geometry::Rect(rect) => out.push(rect.to_polygon()),
        Geometry::Triangle(triangle) => out.push(triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => {
            for member in collection.0 {
                collect_polygons(member, out);
            }
        }
        _ => {}
    }
}

/// Parse a FeatureCollection (or single Feature / Geometry) into a dataset
pub fn parse_dataset(text: &str, name: impl Into<String>) -> Result<VectorDataset> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| GeoclipError::format("GeoJSON", format!("Failed to parse GeoJSON: {}", e)))?;

    let (features, crs) = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = extract_crs(fc.foreign_members.as_ref());
            let features = fc
                .features
                .into_iter()
                .map(convert_feature)
                .collect::<Result<Vec<_>>>()?;
            (features, crs)
        }
        GeoJson::Feature(feature) => {
            let crs = extract_crs(feature.foreign_members.as_ref());
            (vec![convert_feature(feature)?], crs)
        }
        GeoJson::Geometry(geometry) => {
            let converted = convert_geometry(&geometry)?;
            (vec![VectorFeature::new(Some(converted), JsonObject::new())], None)
        }
    };

    // RFC 7946 coordinates are WGS84 unless a legacy `crs` member says otherwise
    Ok(VectorDataset::new(name, Some(crs.unwrap_or_else(Crs::wgs84)), features))
}

fn convert_feature(feature: Feature) -> Result<VectorFeature> {
    let geometry = feature.geometry.as_ref().map(convert_geometry).transpose()?;
    Ok(VectorFeature::new(geometry, feature.properties.unwrap_or_default()))
}

fn convert_geometry(geometry: &geojson::Geometry) -> Result<Geometry<f64>> {
    Geometry::<f64>::try_from(&geometry.value)
        .map_err(|e| GeoclipError::format("GeoJSON", format!("Unsupported geometry: {}", e)))
}

/// Serialize a dataset as a named FeatureCollection.
///
/// Features get their running index as `id`. A `crs` member is emitted for
/// datasets whose CRS has an EPSG code.
pub fn to_feature_collection_string(dataset: &VectorDataset) -> Result<String> {
    let features = dataset
        .features
        .iter()
        .enumerate()
        .map(|(idx, feature)| Feature {
            bbox: None,
            geometry: feature.geometry.as_ref().map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: Some(geojson::feature::Id::String(idx.to_string())),
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        })
        .collect();

    let mut foreign_members = JsonObject::new();
    foreign_members.insert("name".to_string(), Value::String(dataset.name.clone()));
    if let Some(code) = dataset.crs.as_ref().and_then(|crs| crs.epsg) {
        foreign_members.insert("crs".to_string(), crs_member(code));
    }

    let collection = FeatureCollection { bbox: None, features, foreign_members: Some(foreign_members) };

    Ok(serde_json::to_string(&collection)?)
}

fn crs_member(code: u32) -> Value {
    let name = if code == 4326 {
        "urn:ogc:def:crs:OGC:1.3:CRS84".to_string()
    } else {
        format!("urn:ogc:def:crs:EPSG::{}", code)
    };
    json!({ "type": "name", "properties": { "name": name } })
}

/// Extract the CRS from a legacy `crs` member
fn extract_crs(foreign_members: Option<&JsonObject>) -> Option<Crs> {
    let name = foreign_members?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;

    match Crs::parse(name) {
        Ok(crs) => Some(crs),
        Err(e) => {
            tracing::warn!("Ignoring GeoJSON crs member: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Area};

    #[test]
    fn test_boundary_from_feature_collection_merges_polygons() {
        let value = json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::32748" } },
            "features": [
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": { "type": "Point", "coordinates": [9.0, 9.0] }
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [[[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0], [5.0, 5.0]]]]
                    }
                }
            ]
        });

        let boundary = parse_boundary(&value).unwrap();
        assert_eq!(boundary.polygons.0.len(), 2);
        assert_eq!(boundary.crs.epsg, Some(32748));
        assert!((boundary.polygons.unsigned_area() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_without_polygons_is_rejected() {
        let value = json!({ "type": "Point", "coordinates": [1.0, 2.0] });
        let err = parse_boundary(&value).unwrap_err();
        assert!(matches!(err, GeoclipError::Input { .. }));
    }

    #[test]
    fn test_boundary_rejects_non_geojson() {
        let err = parse_boundary(&json!({ "type": "Banana" })).unwrap_err();
        assert!(matches!(err, GeoclipError::Input { .. }));
    }

    #[test]
    fn test_feature_collection_output() {
        let mut props = JsonObject::new();
        props.insert("name".to_string(), json!("well"));
        let dataset = VectorDataset::new(
            "clipped_1",
            Some(Crs::wgs84()),
            vec![
                VectorFeature::new(Some(point!(x: 0.5, y: 0.5).into()), props),
                VectorFeature::new(None, JsonObject::new()),
            ],
        );

        let text = to_feature_collection_string(&dataset).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["name"], "clipped_1");
        assert_eq!(value["crs"]["properties"]["name"], "urn:ogc:def:crs:OGC:1.3:CRS84");
        assert_eq!(value["features"][0]["id"], "0");
        assert_eq!(value["features"][1]["id"], "1");
        assert_eq!(value["features"][0]["properties"]["name"], "well");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert!(value["features"][1]["geometry"].is_null());

        let reparsed = parse_dataset(&text, "again").unwrap();
        assert_eq!(reparsed.len(), 2);
        assert!(reparsed.crs.unwrap().is_wgs84());
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parcels.geojson");
        fs::write(
            &path,
            r#"{"type":"Feature","properties":{"a":1},"geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}"#,
        )
        .unwrap();

        let dataset = GeoJsonFormat.read(&path).unwrap();
        assert_eq!(dataset.name, "parcels");
        assert_eq!(dataset.features[0].properties["a"], 1);
        assert!(GeoJsonFormat.can_read(&path));
    }
}
