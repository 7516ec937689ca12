use geo::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::geometry::Crs;

/// Attribute table of a single feature
pub type Properties = Map<String, Value>;

/// Broad geometry family.
///
/// A shapefile holds exactly one category, so the packager checks this
/// before writing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryCategory {
    Point,
    Line,
    Polygon,
}

impl GeometryCategory {
    /// Category of a geometry, `None` for collections and empty shapes
    pub fn of(geometry: &Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Some(Self::Point),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(Self::Line)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(Self::Polygon),
            Geometry::GeometryCollection(_) => None,
        }
    }
}

impl std::fmt::Display for GeometryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Point => write!(f, "Point"),
            Self::Line => write!(f, "Line"),
            Self::Polygon => write!(f, "Polygon"),
        }
    }
}

/// A single feature of a vector layer
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeature {
    /// Geometry, `None` for null shapes
    pub geometry: Option<Geometry<f64>>,

    /// Attributes, in source column order
    pub properties: Properties,
}

impl VectorFeature {
    pub fn new(geometry: Option<Geometry<f64>>, properties: Properties) -> Self {
        Self { geometry, properties }
    }
}

/// An ordered vector layer with one dataset-level CRS
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDataset {
    /// Layer name (file stem of the source)
    pub name: String,

    /// Reference frame, `None` when the source carried no projection
    pub crs: Option<Crs>,

    pub features: Vec<VectorFeature>,
}

impl VectorDataset {
    pub fn new(name: impl Into<String>, crs: Option<Crs>, features: Vec<VectorFeature>) -> Self {
        Self { name: name.into(), crs, features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Distinct geometry categories present, in order of first appearance
    pub fn categories(&self) -> Vec<GeometryCategory> {
        let mut seen = Vec::new();
        for category in self
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .filter_map(GeometryCategory::of)
        {
            if !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon};

    #[test]
    fn test_categories_in_order() {
        let dataset = VectorDataset::new(
            "mixed",
            None,
            vec![
                VectorFeature::new(Some(point!(x: 1.0, y: 1.0).into()), Properties::new()),
                VectorFeature::new(None, Properties::new()),
                VectorFeature::new(
                    Some(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into()),
                    Properties::new(),
                ),
                VectorFeature::new(Some(point!(x: 2.0, y: 2.0).into()), Properties::new()),
            ],
        );

        assert_eq!(dataset.categories(), vec![GeometryCategory::Point, GeometryCategory::Line]);
    }

    #[test]
    fn test_polygon_category() {
        let poly: Geometry<f64> =
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)].into();
        assert_eq!(GeometryCategory::of(&poly), Some(GeometryCategory::Polygon));
    }
}
