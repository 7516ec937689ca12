//! Format abstraction layer
//!
//! Vector formats implement [`FormatReader`] and/or [`FormatWriter`] so the
//! pipeline can read the source layer and write the clipped layer without
//! knowing format details. Archive handling lives in [`archive`].

use std::path::Path;

use crate::error::Result;
use crate::models::VectorDataset;

pub mod archive;
pub mod geojson;
pub mod shapefile;

pub use self::geojson::GeoJsonFormat;
pub use self::shapefile::ShapefileFormat;

/// Reads a vector layer from disk
pub trait FormatReader: Send + Sync {
    /// Read a dataset from the given path
    fn read(&self, path: &Path) -> Result<VectorDataset>;

    /// Get supported file extensions (e.g., ["shp", "geojson"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "Shapefile", "GeoJSON")
    fn format_name(&self) -> &str;

    /// Check whether a path carries one of the supported extensions
    fn can_read(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.supported_extensions().iter().any(|s| s.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Writes a vector layer to disk
pub trait FormatWriter: Send + Sync {
    /// Write `dataset` to `path`, returning every file that was created
    fn write(&self, dataset: &VectorDataset, path: &Path) -> Result<Vec<std::path::PathBuf>>;

    fn format_name(&self) -> &str;
}
