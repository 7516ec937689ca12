//! CRS transformation

use geo::{Coord, Geometry, MapCoords, MultiPolygon};
use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::models::{Boundary, Crs, VectorDataset, VectorFeature};
use proj::Proj;

/// Coordinate transformation between two CRS.
///
/// Built once per source/target pair. When both sides are the same CRS no
/// PROJ object is created and coordinates pass through unchanged.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    proj: Option<Proj>,
}

impl std::fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reprojector")
            .field("from", &self.from.label())
            .field("to", &self.to.label())
            .field("identity", &self.proj.is_none())
            .finish()
    }
}

impl Reprojector {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let proj = if from.same_as(to) {
            None
        } else {
            let proj = Proj::new_known_crs(&from.definition, &to.definition, None).map_err(|e| {
                GeoclipError::projection(format!(
                    "Failed to create projection from {} to {}: {}",
                    from.label(),
                    to.label(),
                    e
                ))
            })?;
            Some(proj)
        };

        Ok(Self { from: from.clone(), to: to.clone(), proj })
    }

    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    pub fn target(&self) -> &Crs {
        &self.to
    }

    /// Transform a single `(x, y)` position
    pub fn convert(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let Some(proj) = &self.proj else {
            return Ok((x, y));
        };

        let (tx, ty) = proj.convert((x, y)).map_err(|e| {
            GeoclipError::projection(format!(
                "Projection of ({}, {}) from {} to {} failed: {}",
                x,
                y,
                self.from.label(),
                self.to.label(),
                e
            ))
        })?;

        if !tx.is_finite() || !ty.is_finite() {
            return Err(GeoclipError::projection(format!(
                "({}, {}) has no finite position in {}",
                x,
                y,
                self.to.label()
            )));
        }

        Ok((tx, ty))
    }

    /// Transform every coordinate of a geometry
    pub fn geometry(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        if self.is_identity() {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|c: Coord<f64>| self.convert(c.x, c.y).map(|(x, y)| Coord { x, y }))
    }

    pub fn multi_polygon(&self, polygons: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        if self.is_identity() {
            return Ok(polygons.clone());
        }
        polygons.try_map_coords(|c: Coord<f64>| self.convert(c.x, c.y).map(|(x, y)| Coord { x, y }))
    }
}

/// Reproject a boundary into `target`
pub fn reproject_boundary(boundary: &Boundary, target: &Crs) -> Result<Boundary> {
    let reprojector = Reprojector::new(&boundary.crs, target)?;
    Ok(Boundary::new(reprojector.multi_polygon(&boundary.polygons)?, target.clone()))
}

/// Reproject every feature of a dataset into `target`.
///
/// A dataset without a CRS cannot be placed and fails with a projection
/// error.
pub fn reproject_dataset(dataset: &VectorDataset, target: &Crs) -> Result<VectorDataset> {
    let source = dataset.crs.as_ref().ok_or_else(|| {
        GeoclipError::projection(format!("Dataset '{}' has no coordinate reference system", dataset.name))
    })?;

    let reprojector = Reprojector::new(source, target)?;
    let features = dataset
        .features
        .iter()
        .map(|feature| {
            let geometry = feature.geometry.as_ref().map(|g| reprojector.geometry(g)).transpose()?;
            Ok(VectorFeature::new(geometry, feature.properties.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(VectorDataset::new(dataset.name.clone(), Some(target.clone()), features))
}
