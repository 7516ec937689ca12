//! GeoClip Geo - CRS reprojection, vector clipping and bounds
//!
//! This crate handles the geometric half of a job: moving geometries between
//! reference frames, intersecting a vector layer with the boundary and
//! computing geographic extents.

pub mod bounds;
pub mod clip;
pub mod transform;

pub use bounds::{geo_bounds, Extent};
pub use clip::VectorClipper;
pub use transform::{reproject_boundary, reproject_dataset, Reprojector};
