use std::collections::BTreeMap;

use geo::{BoundingRect, MultiPolygon, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::geometry::{BoundingBox, Crs};
use crate::error::{GeoclipError, Result};
use crate::formats::geojson::parse_boundary;

/// Clip boundary: every polygon of the request merged into one shape
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub polygons: MultiPolygon<f64>,
    pub crs: Crs,
}

impl Boundary {
    pub fn new(polygons: MultiPolygon<f64>, crs: Crs) -> Self {
        Self { polygons, crs }
    }

    /// Envelope of the boundary, `None` when it has no coordinates
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.polygons.bounding_rect()
    }
}

/// A single clip job as received from the caller
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub request_id: String,

    /// Parsed boundary
    pub boundary: Boundary,

    /// Boundary GeoJSON exactly as received, kept for the workspace copy
    pub boundary_source: String,

    /// Storage key of the zipped shapefile
    pub vector_ref: String,

    /// Storage key of the GeoTIFF
    pub raster_ref: String,
}

impl JobRequest {
    /// Build a request from its JSON form.
    ///
    /// `request_id` may be a string or an integer and `geojson` may be an
    /// object or a string holding serialized GeoJSON. The boundary is parsed
    /// here, so an invalid one never reaches the pipeline.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| GeoclipError::input("job request must be a JSON object"))?;

        let request_id = match object.get("request_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(n)) if n.is_u64() || n.is_i64() => n.to_string(),
            Some(_) => return Err(GeoclipError::input("request_id must be a string or an integer")),
            None => return Err(GeoclipError::input("missing field 'request_id'")),
        };

        let (boundary_source, boundary_value) = match object.get("geojson") {
            Some(Value::String(text)) => {
                let parsed: Value = serde_json::from_str(text).map_err(|e| {
                    GeoclipError::input(format!("geojson is not valid JSON: {}", e))
                })?;
                (text.clone(), parsed)
            }
            Some(v @ Value::Object(_)) => (v.to_string(), v.clone()),
            Some(_) => return Err(GeoclipError::input("geojson must be an object or a string")),
            None => return Err(GeoclipError::input("missing field 'geojson'")),
        };

        let boundary = parse_boundary(&boundary_value)?;

        Ok(Self {
            request_id,
            boundary,
            boundary_source,
            vector_ref: required_string(object, "shapefile_s3")?,
            raster_ref: required_string(object, "raster_s3")?,
        })
    }
}

fn required_string(object: &serde_json::Map<String, Value>, key: &str) -> Result<String> {
    match object.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(GeoclipError::input(format!("field '{}' is empty", key))),
        Some(_) => Err(GeoclipError::input(format!("field '{}' must be a string", key))),
        None => Err(GeoclipError::input(format!("missing field '{}'", key))),
    }
}

/// Kind of published artifact and the result key it is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactRole {
    GeoJson,
    Raster,
    Preview,
    Archive,
}

impl ArtifactRole {
    pub const ALL: [ArtifactRole; 4] =
        [ArtifactRole::GeoJson, ArtifactRole::Raster, ArtifactRole::Preview, ArtifactRole::Archive];

    pub fn result_key(&self) -> &'static str {
        match self {
            ArtifactRole::GeoJson => "geojson_s3",
            ArtifactRole::Raster => "tif_s3",
            ArtifactRole::Preview => "png_s3",
            ArtifactRole::Archive => "zip_s3",
        }
    }
}

impl std::fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.result_key())
    }
}

/// Everything a successful job reports back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Result key (`geojson_s3`, `tif_s3`, ...) to storage URL
    #[serde(flatten)]
    pub artifacts: BTreeMap<String, String>,

    /// Geographic extent of the clipped raster
    pub bounds: BoundingBox,

    /// Serialized clipped FeatureCollection
    pub geojson_result: String,
}

impl JobResult {
    pub fn url(&self, role: ArtifactRole) -> Option<&str> {
        self.artifacts.get(role.result_key()).map(String::as_str)
    }
}
