//! Vector clipping against the job boundary

use geo::{
    BooleanOps, BoundingRect, Geometry, GeometryCollection, Intersects, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Polygon,
};
use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::models::{Boundary, VectorDataset, VectorFeature};
use rstar::{RTree, RTreeObject, AABB};

use crate::transform::reproject_boundary;

/// Feature envelope stored in the candidate index
#[derive(Debug, Clone, PartialEq)]
struct IndexedFeature {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Clips a vector layer to a boundary polygon.
///
/// The result stays in the layer's own CRS, keeps feature order and
/// attributes, and never contains bare points: they are wrapped into
/// single-member multipoints so one layer holds a single geometry type.
#[derive(Debug, Default, Clone, Copy)]
pub struct VectorClipper;

impl VectorClipper {
    pub fn new() -> Self {
        Self
    }

    pub fn clip(&self, boundary: &Boundary, dataset: &VectorDataset) -> Result<VectorDataset> {
        let dataset_crs = dataset.crs.as_ref().ok_or_else(|| {
            GeoclipError::projection(format!(
                "Dataset '{}' has no coordinate reference system",
                dataset.name
            ))
        })?;

        let boundary = reproject_boundary(boundary, dataset_crs)?;
        let mask = dissolve(&boundary.polygons);
        let mut features = Vec::new();

        if let Some(envelope) = boundary.envelope() {
            let query = AABB::from_corners(
                [envelope.min().x, envelope.min().y],
                [envelope.max().x, envelope.max().y],
            );

            let tree = RTree::bulk_load(
                dataset
                    .features
                    .iter()
                    .enumerate()
                    .filter_map(|(index, f)| {
                        let rect = f.geometry.as_ref()?.bounding_rect()?;
                        Some(IndexedFeature {
                            index,
                            envelope: AABB::from_corners(
                                [rect.min().x, rect.min().y],
                                [rect.max().x, rect.max().y],
                            ),
                        })
                    })
                    .collect(),
            );

            let mut candidates: Vec<usize> =
                tree.locate_in_envelope_intersecting(&query).map(|f| f.index).collect();
            candidates.sort_unstable();

            tracing::debug!(
                "{} of {} features intersect the boundary envelope",
                candidates.len(),
                dataset.len()
            );

            for index in candidates {
                let feature = &dataset.features[index];
                let Some(geometry) = feature.geometry.as_ref() else { continue };

                if let Some(clipped) = clip_geometry(geometry, &mask) {
                    features.push(VectorFeature::new(
                        Some(promote_point(clipped)),
                        feature.properties.clone(),
                    ));
                }
            }
        }

        tracing::info!(
            "Clipped '{}': {} of {} features kept",
            dataset.name,
            features.len(),
            dataset.len()
        );

        Ok(VectorDataset::new(dataset.name.clone(), dataset.crs.clone(), features))
    }
}

/// Union of the boundary polygons.
///
/// Boolean ops treat a multipolygon with the even-odd rule, so overlapping
/// members have to be merged before they can act as a clip mask.
pub fn dissolve(polygons: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if polygons.0.len() < 2 {
        return polygons.clone();
    }
    polygons
        .0
        .iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, polygon| acc.union(polygon))
}

/// Intersect one geometry with a dissolved boundary, `None` when nothing remains
pub fn clip_geometry(geometry: &Geometry<f64>, boundary: &MultiPolygon<f64>) -> Option<Geometry<f64>> {
    match geometry {
        Geometry::Point(point) => boundary.intersects(point).then(|| Geometry::Point(*point)),
        Geometry::MultiPoint(multi) => {
            let kept: Vec<_> = multi.0.iter().filter(|p| boundary.intersects(*p)).copied().collect();
            (!kept.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(kept)))
        }
        Geometry::Line(line) => {
            clip_lines(boundary, MultiLineString::new(vec![LineString::from(vec![line.start, line.end])]))
        }
        Geometry::LineString(line) => clip_lines(boundary, MultiLineString::new(vec![line.clone()])),
        Geometry::MultiLineString(lines) => clip_lines(boundary, lines.clone()),
        Geometry::Polygon(polygon) => clip_polygons(boundary.intersection(polygon)),
        Geometry::MultiPolygon(polygons) => clip_polygons(boundary.intersection(polygons)),
        Geometry::Rect(rect) => clip_polygons(boundary.intersection(&rect.to_polygon())),
        Geometry::Triangle(triangle) => clip_polygons(boundary.intersection(&triangle.to_polygon())),
        Geometry::GeometryCollection(collection) => {
            let kept: Vec<Geometry<f64>> =
                collection.0.iter().filter_map(|g| clip_geometry(g, boundary)).collect();
            (!kept.is_empty()).then(|| Geometry::GeometryCollection(GeometryCollection::from(kept)))
        }
    }
}

fn clip_lines(boundary: &MultiPolygon<f64>, lines: MultiLineString<f64>) -> Option<Geometry<f64>> {
    let mut parts: Vec<LineString<f64>> = boundary
        .clip(&lines, false)
        .0
        .into_iter()
        .filter(|part| part.0.len() >= 2)
        .collect();

    match parts.len() {
        0 => None,
        1 => parts.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(parts))),
    }
}

fn clip_polygons(result: MultiPolygon<f64>) -> Option<Geometry<f64>> {
    let mut polygons: Vec<Polygon<f64>> =
        result.0.into_iter().filter(|p| p.exterior().0.len() >= 4).collect();

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

/// Wrap a bare point into a single-member multipoint
fn promote_point(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Point(point) => Geometry::MultiPoint(MultiPoint::new(vec![point])),
        other => other,
    }
}
