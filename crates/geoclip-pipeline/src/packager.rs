//! Vector packaging: GeoJSON file plus zipped shapefile

use std::fs;
use std::path::PathBuf;

use geoclip_core::error::Result;
use geoclip_core::formats::archive::write_zip;
use geoclip_core::formats::geojson::{parse_dataset, to_feature_collection_string};
use geoclip_core::formats::shapefile::write_dataset;
use geoclip_core::models::VectorDataset;
use geoclip_core::workspace::{JobWorkspace, SHAPEFILE_COMPONENTS};

/// Files produced for one clipped vector dataset
#[derive(Debug, Clone)]
pub struct PackagedVector {
    pub geojson_path: PathBuf,

    /// FeatureCollection text, identical to the file content
    pub geojson_text: String,

    pub archive_path: PathBuf,

    /// Component file names stored in the archive
    pub archive_entries: Vec<String>,

    pub feature_count: usize,
}

/// Serializes a clipped dataset as GeoJSON and as a zipped shapefile
#[derive(Debug, Default, Clone, Copy)]
pub struct VectorPackager;

impl VectorPackager {
    pub fn new() -> Self {
        Self
    }

    pub fn package(&self, dataset: &VectorDataset, workspace: &JobWorkspace) -> Result<PackagedVector> {
        // GeoJSON
        let geojson_path = workspace.clipped_geojson();
        let geojson_text = to_feature_collection_string(dataset)?;
        fs::write(&geojson_path, &geojson_text)?;

        // Shapefile components, then the archive of whichever exist
        write_dataset(dataset, &workspace.clipped_shapefile("shp"))?;

        let mut components = Vec::new();
        for extension in SHAPEFILE_COMPONENTS {
            let path = workspace.clipped_shapefile(extension);
            if path.is_file() {
                components.push(path);
            } else {
                tracing::warn!("Shapefile component .{} was not produced; leaving it out of the archive", extension);
            }
        }

        let archive_path = workspace.shapefile_archive();
        write_zip(&components, &archive_path)?;

        let archive_entries: Vec<String> = components
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();

        for path in &components {
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!("Failed to remove {}: {}", path.display(), e);
            }
        }

        tracing::info!(
            "Packaged {} feature(s): {} and {} ({})",
            dataset.len(),
            geojson_path.display(),
            archive_path.display(),
            archive_entries.join(", ")
        );

        Ok(PackagedVector {
            geojson_path,
            geojson_text,
            archive_path,
            archive_entries,
            feature_count: dataset.len(),
        })
    }

    /// Parse a produced FeatureCollection and package it again
    pub fn repackage(&self, geojson_result: &str, workspace: &JobWorkspace) -> Result<PackagedVector> {
        let dataset = parse_dataset(geojson_result, format!("clipped_{}", workspace.request_id()))?;
        self.package(&dataset, workspace)
    }
}
