//! Raster masking and cropping against the job boundary

use geo::{Coord, LineString, MultiPolygon};
use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::models::Boundary;
use geoclip_geo::reproject_boundary;

use crate::models::{Affine, PixelWindow, Raster};

/// Pixel coordinates closer than this to an integer are snapped to it
const SNAP_EPSILON: f64 = 1e-9;

/// Masks a raster to a boundary polygon and crops it to the boundary's
/// extent.
///
/// Pixels whose center falls outside the boundary are set to the raster's
/// no-data value (0 when it has none) in every band. The output keeps the
/// source bands, sample type, CRS and no-data value; width, height and
/// transform describe the cropped window.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterClipper;

impl RasterClipper {
    pub fn new() -> Self {
        Self
    }

    pub fn clip(&self, boundary: &Boundary, raster: &Raster) -> Result<Raster> {
        let raster_crs = raster.crs().ok_or_else(|| {
            GeoclipError::projection("Raster has no coordinate reference system")
        })?;

        let boundary = reproject_boundary(boundary, raster_crs)?;
        let to_pixel = raster.transform().inverse().ok_or_else(|| {
            GeoclipError::processing("clip_raster", "Raster transform is not invertible")
        })?;

        let rings = pixel_polygons(&boundary.polygons, &to_pixel);
        let fill = raster.nodata().unwrap_or(0.0);

        let window = covering_window(&rings, raster.width(), raster.height());
        if window.is_empty() {
            tracing::warn!("Boundary does not overlap the raster; producing a degenerate 1x1 raster");
            return degenerate(raster, &rings, fill);
        }

        let inside = rasterize(&rings, &window);
        let bands = raster.bands();
        let mut data = Vec::with_capacity(window.width * window.height * bands);

        for row in 0..window.height {
            for col in 0..window.width {
                let keep = inside[row * window.width + col];
                for band in 0..bands {
                    data.push(if keep {
                        raster.get(band, window.col_off + col, window.row_off + row)
                    } else {
                        fill
                    });
                }
            }
        }

        let kept = inside.iter().filter(|k| **k).count();
        tracing::info!(
            "Masked raster to {}x{} window at ({}, {}), {} of {} pixels inside boundary",
            window.width,
            window.height,
            window.col_off,
            window.row_off,
            kept,
            inside.len()
        );

        Raster::new(
            bands,
            window.width,
            window.height,
            raster.sample_type(),
            data,
            raster.transform().translated(window.col_off, window.row_off),
            raster.crs().cloned(),
            raster.nodata(),
        )
    }
}

/// Boundary polygons as rings in pixel space, exterior first
fn pixel_polygons(polygons: &MultiPolygon<f64>, to_pixel: &Affine) -> Vec<Vec<Vec<Coord<f64>>>> {
    let ring = |line: &LineString<f64>| -> Vec<Coord<f64>> {
        line.0
            .iter()
            .map(|c| {
                let (x, y) = to_pixel.apply(c.x, c.y);
                Coord { x: snap(x), y: snap(y) }
            })
            .collect()
    };

    polygons
        .0
        .iter()
        .map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()).map(ring).collect())
        .collect()
}

fn snap(v: f64) -> f64 {
    let rounded = v.round();
    if (v - rounded).abs() < SNAP_EPSILON {
        rounded
    } else {
        v
    }
}

fn pixel_bounds(rings: &[Vec<Vec<Coord<f64>>>]) -> Option<(f64, f64, f64, f64)> {
    let mut coords = rings.iter().flat_map(|p| p.iter().take(1)).flatten().peekable();
    coords.peek()?;

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in coords {
        min_x = min_x.min(c.x);
        min_y = min_y.min(c.y);
        max_x = max_x.max(c.x);
        max_y = max_y.max(c.y);
    }
    Some((min_x, min_y, max_x, max_y))
}

/// Smallest window of whole pixels covering the boundary, clamped to the grid
fn covering_window(rings: &[Vec<Vec<Coord<f64>>>], width: usize, height: usize) -> PixelWindow {
    let Some((min_x, min_y, max_x, max_y)) = pixel_bounds(rings) else {
        return PixelWindow::new(0, 0, 0, 0);
    };

    let clamp = |v: f64, limit: usize| -> usize { v.max(0.0).min(limit as f64) as usize };

    let col_start = clamp(min_x.floor(), width);
    let col_end = clamp(max_x.ceil(), width);
    let row_start = clamp(min_y.floor(), height);
    let row_end = clamp(max_y.ceil(), height);

    PixelWindow::new(
        col_start,
        row_start,
        col_end.saturating_sub(col_start),
        row_end.saturating_sub(row_start),
    )
}

/// Scanline even-odd fill at pixel centers.
///
/// Each polygon is filled on its own (exterior and holes together) and the
/// results are OR-ed, so overlapping boundary parts do not cancel out.
fn rasterize(rings: &[Vec<Vec<Coord<f64>>>], window: &PixelWindow) -> Vec<bool> {
    let mut inside = vec![false; window.width * window.height];
    let mut crossings = Vec::new();

    for polygon in rings {
        for row in 0..window.height {
            let y = (window.row_off + row) as f64 + 0.5;

            crossings.clear();
            for ring in polygon {
                for edge in ring.windows(2) {
                    let (p, q) = (edge[0], edge[1]);
                    if (p.y > y) != (q.y > y) {
                        crossings.push(p.x + (y - p.y) * (q.x - p.x) / (q.y - p.y));
                    }
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for span in crossings.chunks_exact(2) {
                // Columns whose center c + 0.5 lies in [span[0], span[1])
                let start = (span[0] - 0.5).ceil() - window.col_off as f64;
                let end = (span[1] - 0.5).ceil() - window.col_off as f64;
                let start = start.max(0.0).min(window.width as f64) as usize;
                let end = end.max(0.0).min(window.width as f64) as usize;

                for col in start..end {
                    inside[row * window.width + col] = true;
                }
            }
        }
    }

    inside
}

/// 1x1 fill-valued raster anchored at the grid cell nearest the boundary's
/// top-left corner
fn degenerate(raster: &Raster, rings: &[Vec<Vec<Coord<f64>>>], fill: f64) -> Result<Raster> {
    let (col, row) = match pixel_bounds(rings) {
        Some((min_x, min_y, _, _)) => {
            let last_col = (raster.width() - 1) as f64;
            let last_row = (raster.height() - 1) as f64;
            (min_x.floor().max(0.0).min(last_col) as usize, min_y.floor().max(0.0).min(last_row) as usize)
        }
        None => (0, 0),
    };

    Raster::new(
        raster.bands(),
        1,
        1,
        raster.sample_type(),
        vec![fill; raster.bands()],
        raster.transform().translated(col, row),
        raster.crs().cloned(),
        raster.nodata(),
    )
}
