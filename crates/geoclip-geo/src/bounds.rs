//! Geographic bounds of a georeferenced extent

use geoclip_core::error::Result;
use geoclip_core::models::{BoundingBox, Crs};

use crate::transform::Reprojector;

/// Axis-aligned extent in some CRS, `left`/`right` along x and
/// `bottom`/`top` along y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Extent {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self { left, bottom, right, top }
    }
}

/// Compute the bounds of `extent` (expressed in `crs`) in `output`.
///
/// Only the top-left and bottom-right corners are transformed; the result
/// takes min/max over both so it stays well-formed even when the target
/// axes are flipped.
pub fn geo_bounds(extent: &Extent, crs: &Crs, output: &Crs) -> Result<BoundingBox> {
    let reprojector = Reprojector::new(crs, output)?;

    let top_left = reprojector.convert(extent.left, extent.top)?;
    let bottom_right = reprojector.convert(extent.right, extent.bottom)?;

    Ok(BoundingBox::from_corners(top_left, bottom_right))
}
