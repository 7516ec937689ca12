//! ESRI Shapefile reading and writing
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj,
//! .cpg). Reading requires the first three; a missing .prj leaves the layer
//! without a CRS. Writing produces all five, with the attribute schema
//! inferred from the JSON properties of the features.

use std::collections::HashSet;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon};
use serde_json::Value;
use shapefile::dbase::{self, FieldName, FieldValue as DbaseFieldValue, TableWriterBuilder};
use shapefile::{Reader as ShapefileReader, Shape};

use crate::error::{GeoclipError, Result};
use crate::formats::{FormatReader, FormatWriter};
use crate::models::{Crs, GeometryCategory, VectorDataset, VectorFeature};

/// ESRI WKT written to `.prj` for WGS84 outputs
pub const WGS84_ESRI_WKT: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

const FORMAT: &str = "Shapefile";
const MAX_CHARACTER_WIDTH: usize = 254;
const TEXT_WIDTH: usize = 80;

/// Shapefile format
pub struct ShapefileFormat;

impl FormatReader for ShapefileFormat {
    fn read(&self, path: &Path) -> Result<VectorDataset> {
        verify_components(path)?;

        let mut reader = ShapefileReader::from_path(path)
            .map_err(|e| GeoclipError::format(FORMAT, format!("Failed to open Shapefile: {}", e)))?;

        let crs = read_crs(path)?;
        let features = read_features(&mut reader)?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        Ok(VectorDataset::new(name, crs, features))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        FORMAT
    }
}

impl FormatWriter for ShapefileFormat {
    fn write(&self, dataset: &VectorDataset, path: &Path) -> Result<Vec<PathBuf>> {
        write_dataset(dataset, path)
    }

    fn format_name(&self) -> &str {
        FORMAT
    }
}

/// Verify that all required Shapefile component files exist
fn verify_components(path: &Path) -> Result<()> {
    let mut missing = Vec::new();

    for ext in ["shp", "shx", "dbf"] {
        if !path.with_extension(ext).exists() {
            missing.push(format!(".{}", ext));
        }
    }

    if !missing.is_empty() {
        return Err(GeoclipError::format(
            FORMAT,
            format!("Missing required component files: {}", missing.join(", ")),
        ));
    }

    Ok(())
}

/// Read the CRS from the `.prj` sidecar, `None` when there is none
fn read_crs(path: &Path) -> Result<Option<Crs>> {
    let prj_path = path.with_extension("prj");
    if !prj_path.exists() {
        tracing::debug!("No .prj next to {}", path.display());
        return Ok(None);
    }

    let prj_content = fs::read_to_string(&prj_path)
        .map_err(|e| GeoclipError::format(FORMAT, format!("Failed to read .prj file: {}", e)))?;

    if prj_content.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(Crs::from_wkt(&prj_content)))
}

fn read_features(
    reader: &mut ShapefileReader<BufReader<fs::File>, BufReader<fs::File>>,
) -> Result<Vec<VectorFeature>> {
    let mut features = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result
            .map_err(|e| GeoclipError::format(FORMAT, format!("Failed to read feature: {}", e)))?;

        let geometry = convert_shape(&shape)?;

        let mut properties = serde_json::Map::new();
        for (name, value) in record {
            properties.insert(name, convert_dbase_value(&value));
        }

        features.push(VectorFeature::new(geometry, properties));
    }

    Ok(features)
}

fn coord(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

/// Convert a shapefile shape to a 2D geometry (Z and M are dropped)
fn convert_shape(shape: &Shape) -> Result<Option<Geometry<f64>>> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => geo::Point::new(p.x, p.y).into(),
        Shape::PointM(p) => geo::Point::new(p.x, p.y).into(),
        Shape::PointZ(p) => geo::Point::new(p.x, p.y).into(),
        Shape::Multipoint(mp) => {
            MultiPoint::from(mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect::<Vec<_>>())
                .into()
        }
        Shape::MultipointM(mp) => {
            MultiPoint::from(mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect::<Vec<_>>())
                .into()
        }
        Shape::MultipointZ(mp) => {
            MultiPoint::from(mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect::<Vec<_>>())
                .into()
        }
        Shape::Polyline(line) => lines_to_geometry(
            line.parts().iter().map(|part| part.iter().map(|p| coord(p.x, p.y)).collect()).collect(),
        ),
        Shape::PolylineM(line) => lines_to_geometry(
            line.parts().iter().map(|part| part.iter().map(|p| coord(p.x, p.y)).collect()).collect(),
        ),
        Shape::PolylineZ(line) => lines_to_geometry(
            line.parts().iter().map(|part| part.iter().map(|p| coord(p.x, p.y)).collect()).collect(),
        ),
        Shape::Polygon(polygon) => rings_to_geometry(
            polygon
                .rings()
                .iter()
                .map(|ring| {
                    let coords = ring.points().iter().map(|p| coord(p.x, p.y)).collect();
                    (matches!(ring, shapefile::PolygonRing::Outer(_)), coords)
                })
                .collect(),
        ),
        Shape::PolygonM(polygon) => rings_to_geometry(
            polygon
                .rings()
                .iter()
                .map(|ring| {
                    let coords = ring.points().iter().map(|p| coord(p.x, p.y)).collect();
                    (matches!(ring, shapefile::PolygonRing::Outer(_)), coords)
                })
                .collect(),
        ),
        Shape::PolygonZ(polygon) => rings_to_geometry(
            polygon
                .rings()
                .iter()
                .map(|ring| {
                    let coords = ring.points().iter().map(|p| coord(p.x, p.y)).collect();
                    (matches!(ring, shapefile::PolygonRing::Outer(_)), coords)
                })
                .collect(),
        ),
        Shape::Multipatch(_) => {
            return Err(GeoclipError::format(FORMAT, "Multipatch geometry type is not supported"));
        }
    };

    Ok(Some(geometry))
}

fn lines_to_geometry(mut parts: Vec<Vec<Coord<f64>>>) -> Geometry<f64> {
    if parts.len() == 1 {
        LineString::new(parts.remove(0)).into()
    } else {
        MultiLineString::new(parts.into_iter().map(LineString::new).collect()).into()
    }
}

/// Group rings into polygons: each outer ring starts a polygon and the
/// following inner rings become its holes.
fn rings_to_geometry(rings: Vec<(bool, Vec<Coord<f64>>)>) -> Geometry<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for (is_outer, coords) in rings {
        let ring = LineString::new(coords);
        if !is_outer {
            if let Some((_, holes)) = polygons.last_mut() {
                holes.push(ring);
                continue;
            }
        }
        polygons.push((ring, Vec::new()));
    }

    let mut polygons: Vec<Polygon<f64>> =
        polygons.into_iter().map(|(exterior, holes)| Polygon::new(exterior, holes)).collect();

    if polygons.len() == 1 {
        polygons.remove(0).into()
    } else {
        MultiPolygon::new(polygons).into()
    }
}

/// Convert dBase field value to JSON value
fn convert_dbase_value(value: &DbaseFieldValue) -> Value {
    #[allow(unreachable_patterns)]
    match value {
        DbaseFieldValue::Character(Some(s)) => Value::String(s.clone()),
        DbaseFieldValue::Numeric(Some(n)) => number_value(*n),
        DbaseFieldValue::Logical(Some(b)) => Value::Bool(*b),
        DbaseFieldValue::Date(Some(date)) => {
            Value::String(format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()))
        }
        DbaseFieldValue::Float(Some(f)) => number_value(*f as f64),
        DbaseFieldValue::Integer(i) => Value::Number((*i).into()),
        DbaseFieldValue::Currency(c) => number_value(*c),
        DbaseFieldValue::DateTime(dt) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Double(d) => number_value(*d),
        DbaseFieldValue::Memo(s) => Value::String(s.clone()),
        _ => Value::Null,
    }
}

/// Whole numbers read from Numeric columns come back as integers
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Inferred dBase column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Numeric(18, 0)
    Integer,
    /// Numeric(24, 15)
    Float,
    Logical,
    /// Character with the given width
    Character(usize),
    /// Character(80) holding stringified values
    Text,
}

/// One output column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Property key the values come from
    pub source: String,
    /// dBase column name (at most 10 bytes, unique)
    pub name: String,
    pub kind: FieldKind,
}

/// Infer the dBase schema for a set of features.
///
/// Columns appear in order of first appearance. A layer without any
/// attribute gets a single `FID` column.
pub fn infer_schema(features: &[VectorFeature]) -> Vec<FieldSpec> {
    let mut keys: Vec<String> = Vec::new();
    for feature in features {
        for key in feature.properties.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }

    let mut used = HashSet::new();
    keys.into_iter()
        .map(|key| {
            let kind = infer_kind(features.iter().filter_map(|f| f.properties.get(&key)));
            let name = unique_field_name(&key, &mut used);
            FieldSpec { source: key, name, kind }
        })
        .collect()
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a Value>) -> FieldKind {
    let mut kind: Option<FieldKind> = None;

    for value in values {
        let this = match value {
            Value::Null => continue,
            Value::Bool(_) => FieldKind::Logical,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldKind::Integer,
            Value::Number(_) => FieldKind::Float,
            Value::String(s) => FieldKind::Character(s.len()),
            Value::Array(_) | Value::Object(_) => return FieldKind::Text,
        };

        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(FieldKind::Integer), FieldKind::Integer) => FieldKind::Integer,
            (Some(FieldKind::Integer | FieldKind::Float), FieldKind::Integer | FieldKind::Float) => {
                FieldKind::Float
            }
            (Some(FieldKind::Logical), FieldKind::Logical) => FieldKind::Logical,
            (Some(FieldKind::Character(a)), FieldKind::Character(b)) => FieldKind::Character(a.max(b)),
            _ => return FieldKind::Text,
        });
    }

    match kind {
        None => FieldKind::Text,
        Some(FieldKind::Character(width)) => {
            FieldKind::Character(width.clamp(1, MAX_CHARACTER_WIDTH))
        }
        Some(k) => k,
    }
}

/// Truncate to the 10-byte dBase limit and de-duplicate with numeric suffixes
fn unique_field_name(key: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = key.chars().filter(|c| !c.is_control()).collect();
    let cleaned = if cleaned.is_empty() { "FIELD".to_string() } else { cleaned };

    let base = truncate_bytes(&cleaned, 10).to_string();
    if used.insert(base.to_ascii_uppercase()) {
        return base;
    }

    let mut n = 1usize;
    loop {
        let suffix = format!("_{}", n);
        let candidate = format!("{}{}", truncate_bytes(&cleaned, 10 - suffix.len()), suffix);
        if used.insert(candidate.to_ascii_uppercase()) {
            return candidate;
        }
        n += 1;
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name)
        .map_err(|_| GeoclipError::format(FORMAT, format!("Invalid dBase field name '{}'", name)))
}

fn table_builder(schema: &[FieldSpec]) -> Result<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();
    for field in schema {
        let name = field_name(&field.name)?;
        builder = match field.kind {
            FieldKind::Integer => builder.add_numeric_field(name, 18, 0),
            FieldKind::Float => builder.add_numeric_field(name, 24, 15),
            FieldKind::Logical => builder.add_logical_field(name),
            FieldKind::Character(width) => builder.add_character_field(name, width as u8),
            FieldKind::Text => builder.add_character_field(name, TEXT_WIDTH as u8),
        };
    }
    Ok(builder)
}

fn record_for(feature: &VectorFeature, schema: &[FieldSpec]) -> dbase::Record {
    let mut record = dbase::Record::default();

    for field in schema {
        let value = feature.properties.get(&field.source).unwrap_or(&Value::Null);
        let converted = match field.kind {
            FieldKind::Integer | FieldKind::Float => DbaseFieldValue::Numeric(value.as_f64()),
            FieldKind::Logical => DbaseFieldValue::Logical(value.as_bool()),
            FieldKind::Character(width) => DbaseFieldValue::Character(
                value.as_str().map(|s| truncate_bytes(s, width).to_string()),
            ),
            FieldKind::Text => DbaseFieldValue::Character(match value {
                Value::Null => None,
                Value::String(s) => Some(truncate_bytes(s, TEXT_WIDTH).to_string()),
                other => Some(truncate_bytes(&other.to_string(), TEXT_WIDTH).to_string()),
            }),
        };
        record.insert(field.name.clone(), converted);
    }

    record
}

fn to_shp_point(c: &Coord<f64>) -> shapefile::Point {
    shapefile::Point::new(c.x, c.y)
}

fn to_shp_multipoint(geometry: &Geometry<f64>) -> Option<shapefile::Multipoint> {
    let points: Vec<shapefile::Point> = match geometry {
        Geometry::Point(p) => vec![to_shp_point(&p.0)],
        Geometry::MultiPoint(mp) => mp.0.iter().map(|p| to_shp_point(&p.0)).collect(),
        _ => return None,
    };
    Some(shapefile::Multipoint::new(points))
}

fn to_shp_polyline(geometry: &Geometry<f64>) -> Option<shapefile::Polyline> {
    let parts: Vec<Vec<shapefile::Point>> = match geometry {
        Geometry::Line(line) => vec![vec![to_shp_point(&line.start), to_shp_point(&line.end)]],
        Geometry::LineString(ls) => vec![ls.0.iter().map(to_shp_point).collect()],
        Geometry::MultiLineString(mls) => {
            mls.0.iter().map(|ls| ls.0.iter().map(to_shp_point).collect()).collect()
        }
        _ => return None,
    };
    Some(shapefile::Polyline::with_parts(parts))
}

fn to_shp_polygon(geometry: &Geometry<f64>) -> Option<shapefile::Polygon> {
    let polygons: Vec<Polygon<f64>> = match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        _ => return None,
    };

    let mut rings = Vec::new();
    for polygon in &polygons {
        rings.push(shapefile::PolygonRing::Outer(
            polygon.exterior().0.iter().map(to_shp_point).collect(),
        ));
        for hole in polygon.interiors() {
            rings.push(shapefile::PolygonRing::Inner(hole.0.iter().map(to_shp_point).collect()));
        }
    }
    Some(shapefile::Polygon::with_rings(rings))
}

/// Write `dataset` as a shapefile at `path` (the `.shp` path).
///
/// Features without geometry are skipped. The dataset must hold a single
/// geometry category, otherwise nothing is written.
pub fn write_dataset(dataset: &VectorDataset, path: &Path) -> Result<Vec<PathBuf>> {
    let categories = dataset.categories();
    if categories.len() > 1 {
        let names: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
        return Err(GeoclipError::processing(
            "package_vector",
            format!("Shapefile cannot hold mixed geometry types: {}", names.join(", ")),
        ));
    }

    let features: Vec<&VectorFeature> = dataset
        .features
        .iter()
        .filter(|f| match &f.geometry {
            Some(g) => GeometryCategory::of(g).is_some(),
            None => false,
        })
        .collect();

    let skipped = dataset.features.len() - features.len();
    if skipped > 0 {
        tracing::warn!("Skipping {} feature(s) without a writable geometry", skipped);
    }

    let owned: Vec<VectorFeature> = features.iter().map(|f| (*f).clone()).collect();
    let mut schema = infer_schema(&owned);
    let add_fid = schema.is_empty();
    if add_fid {
        schema.push(FieldSpec { source: String::new(), name: "FID".to_string(), kind: FieldKind::Integer });
    }

    let category = categories.first().copied().unwrap_or(GeometryCategory::Point);
    let builder = table_builder(&schema)?;
    {
        let mut writer = shapefile::Writer::from_path(path, builder).map_err(|e| {
            GeoclipError::format(FORMAT, format!("Failed to create {}: {}", path.display(), e))
        })?;

        for (idx, feature) in owned.iter().enumerate() {
            let mut record = record_for(feature, &schema);
            if add_fid {
                record.insert("FID".to_string(), DbaseFieldValue::Numeric(Some(idx as f64)));
            }

            // Filtered above: every remaining feature has a geometry
            let Some(geometry) = feature.geometry.as_ref() else { continue };
            let written = match category {
                GeometryCategory::Point => to_shp_multipoint(geometry)
                    .map(|shape| writer.write_shape_and_record(&shape, &record)),
                GeometryCategory::Line => to_shp_polyline(geometry)
                    .map(|shape| writer.write_shape_and_record(&shape, &record)),
                GeometryCategory::Polygon => to_shp_polygon(geometry)
                    .map(|shape| writer.write_shape_and_record(&shape, &record)),
            };

            match written {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    return Err(GeoclipError::format(FORMAT, format!("Failed to write feature {}: {}", idx, e)));
                }
                None => {
                    return Err(GeoclipError::processing(
                        "package_vector",
                        format!("Feature {} does not match layer type {}", idx, category),
                    ));
                }
            }
        }
    }

    let mut written = vec![path.with_extension("shp"), path.with_extension("shx"), path.with_extension("dbf")];

    match prj_text(dataset.crs.as_ref()) {
        Some(wkt) => {
            let prj = path.with_extension("prj");
            fs::write(&prj, wkt)?;
            written.push(prj);
        }
        None => tracing::warn!(
            "No WKT available for {}, writing shapefile without .prj",
            dataset.crs.as_ref().map(Crs::label).unwrap_or_else(|| "unknown CRS".to_string())
        ),
    }

    let cpg = path.with_extension("cpg");
    fs::write(&cpg, "UTF-8")?;
    written.push(cpg);

    Ok(written)
}

/// WKT for the `.prj` sidecar, if one can be produced
fn prj_text(crs: Option<&Crs>) -> Option<String> {
    let crs = crs?;
    if crs.is_wgs84() {
        return Some(WGS84_ESRI_WKT.to_string());
    }
    if crs.definition.starts_with("EPSG:") {
        return None;
    }
    Some(crs.definition.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon};
    use serde_json::json;

    fn props(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_infer_schema_types() {
        let features = vec![
            VectorFeature::new(None, props(json!({"count": 1, "ratio": 1, "ok": true, "label": "ab", "empty": null}))),
            VectorFeature::new(None, props(json!({"count": 2, "ratio": 0.5, "ok": false, "label": "abcd", "mixed": 1}))),
            VectorFeature::new(None, props(json!({"mixed": "x"}))),
        ];

        let schema = infer_schema(&features);
        let kind = |name: &str| schema.iter().find(|f| f.source == name).unwrap().kind;

        assert_eq!(kind("count"), FieldKind::Integer);
        assert_eq!(kind("ratio"), FieldKind::Float);
        assert_eq!(kind("ok"), FieldKind::Logical);
        assert_eq!(kind("label"), FieldKind::Character(4));
        assert_eq!(kind("empty"), FieldKind::Text);
        assert_eq!(kind("mixed"), FieldKind::Text);
    }

    #[test]
    fn test_field_names_truncated_and_unique() {
        let features = vec![VectorFeature::new(
            None,
            props(json!({"population_2020": 1, "population_2021": 2, "id": 3})),
        )];

        let schema = infer_schema(&features);
        let names: Vec<&str> = schema.iter().map(|f| f.name.as_str()).collect();

        assert!(names.iter().all(|n| n.len() <= 10));
        assert!(names.contains(&"population"));
        assert!(names.contains(&"populati_1"));
        assert!(names.contains(&"id"));
    }

    #[test]
    fn test_truncate_bytes_keeps_char_boundary() {
        assert_eq!(truncate_bytes("ééééé", 5), "éé");
        assert_eq!(truncate_bytes("abc", 10), "abc");
    }

    #[test]
    fn test_write_and_read_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wells.shp");
        let dataset = VectorDataset::new(
            "wells",
            Some(Crs::wgs84()),
            vec![
                VectorFeature::new(
                    Some(MultiPoint::from(vec![point!(x: 0.5, y: 0.5)]).into()),
                    props(json!({"name": "w1", "depth": 12})),
                ),
                VectorFeature::new(
                    Some(MultiPoint::from(vec![point!(x: 0.2, y: 0.8)]).into()),
                    props(json!({"name": "w2", "depth": 30})),
                ),
            ],
        );

        let files = write_dataset(&dataset, &path).unwrap();
        assert_eq!(files.len(), 5);
        assert!(files.iter().all(|f| f.exists()));
        assert_eq!(fs::read_to_string(path.with_extension("cpg")).unwrap(), "UTF-8");

        let back = ShapefileFormat.read(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert!(back.crs.as_ref().unwrap().is_wgs84());
        assert_eq!(back.features[1].properties["name"], "w2");
        assert_eq!(back.features[1].properties["depth"], 30);
        assert!(matches!(back.features[0].geometry, Some(Geometry::MultiPoint(_))));
    }

    #[test]
    fn test_write_polygons_without_attributes_gets_fid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.shp");
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let dataset = VectorDataset::new(
            "zones",
            Some(Crs::wgs84()),
            vec![VectorFeature::new(Some(square.into()), serde_json::Map::new())],
        );

        write_dataset(&dataset, &path).unwrap();
        let back = ShapefileFormat.read(&path).unwrap();

        assert_eq!(back.features[0].properties["FID"], 0);
        assert!(matches!(back.features[0].geometry, Some(Geometry::Polygon(_))));
    }

    #[test]
    fn test_mixed_categories_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.shp");
        let dataset = VectorDataset::new(
            "mixed",
            Some(Crs::wgs84()),
            vec![
                VectorFeature::new(Some(point!(x: 0.0, y: 0.0).into()), serde_json::Map::new()),
                VectorFeature::new(
                    Some(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into()),
                    serde_json::Map::new(),
                ),
            ],
        );

        let err = write_dataset(&dataset, &path).unwrap_err();
        assert!(matches!(err, GeoclipError::Processing { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_components() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lonely.shp");
        fs::write(&path, b"").unwrap();

        let err = ShapefileFormat.read(&path).unwrap_err();
        assert!(err.to_string().contains(".shx"));
    }

    #[test]
    fn test_missing_prj_means_no_crs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.shp");
        let dataset = VectorDataset::new(
            "roads",
            Some(Crs::wgs84()),
            vec![VectorFeature::new(
                Some(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into()),
                props(json!({"class": "primary"})),
            )],
        );
        write_dataset(&dataset, &path).unwrap();
        fs::remove_file(path.with_extension("prj")).unwrap();

        let back = ShapefileFormat.read(&path).unwrap();
        assert!(back.crs.is_none());
        assert!(matches!(back.features[0].geometry, Some(Geometry::LineString(_))));
    }
}
