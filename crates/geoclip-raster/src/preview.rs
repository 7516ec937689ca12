//! PNG preview of a raster's first band

use std::path::Path;

use geoclip_core::error::{GeoclipError, Result};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::models::Raster;

/// Linearly rescale samples to `0..=255`.
///
/// Min and max are taken over finite samples. A constant (or entirely
/// non-finite) band renders as zeros, as does every non-finite sample.
pub fn normalize_band(samples: &[f64]) -> Vec<u8> {
    let (min, max) = samples
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

    if max <= min {
        return vec![0; samples.len()];
    }

    let range = max - min;
    samples
        .iter()
        .map(|v| if v.is_finite() { ((v - min) / range * 255.0) as u8 } else { 0 })
        .collect()
}

/// Render band 1 as an RGBA image; exact black pixels become transparent
pub fn render_preview(raster: &Raster) -> Result<RgbaImage> {
    let gray = normalize_band(&raster.band(0));
    let width = raster.width() as u32;
    let height = raster.height() as u32;

    let pixels = gray
        .into_iter()
        .flat_map(|v| if v == 0 { [0, 0, 0, 0] } else { Rgba([v, v, v, 255]).0 })
        .collect();

    RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        GeoclipError::processing("render_preview", format!("Pixel buffer does not fit {}x{}", width, height))
    })
}

/// Render and save the preview as PNG, returning its dimensions
pub fn write_preview(raster: &Raster, path: &Path) -> Result<(u32, u32)> {
    let image = render_preview(raster)?;
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| GeoclipError::format("PNG", format!("Failed to write {}: {}", path.display(), e)))?;

    let transparent = image.pixels().filter(|p| p.0[3] == 0).count();
    tracing::debug!(
        "Preview {}x{} written to {} ({} transparent pixels)",
        image.width(),
        image.height(),
        path.display(),
        transparent
    );

    Ok(image.dimensions())
}
