//! Raster side of GeoClip: GeoTIFF IO, boundary masking and preview rendering

pub mod geotiff;
pub mod mask;
pub mod models;
pub mod preview;

pub use geotiff::{read_geotiff, write_geotiff};
pub use mask::RasterClipper;
pub use models::{Affine, PixelWindow, Raster, SampleType};
pub use preview::{normalize_band, render_preview, write_preview};
