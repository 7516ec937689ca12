use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use geoclip_core::config::LayeredConfig;
use geoclip_core::error::{CleanupWarning, GeoclipError, Result};
use geoclip_core::formats::archive::{extract_zip, find_first_with_extension};
use geoclip_core::formats::{FormatReader, ShapefileFormat};
use geoclip_core::models::{ArtifactRole, Crs, JobRequest, JobResult};
use geoclip_core::ports::{ObjectStore, Stage, StageEvent, StageObserver};
use geoclip_core::workspace::JobWorkspace;
use geoclip_geo::{geo_bounds, reproject_dataset, VectorClipper};
use geoclip_raster::{read_geotiff, write_geotiff, write_preview, RasterClipper};

use crate::observer::TracingObserver;
use crate::packager::VectorPackager;
use crate::publisher::ArtifactPublisher;

/// Settings a pipeline run depends on
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Directory job workspaces are created in
    pub work_dir: PathBuf,

    /// CRS of the vector outputs and of the reported bounds
    pub output_crs: Crs,

    /// Key prefix for published artifacts
    pub output_prefix: String,
}

impl PipelineSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            work_dir: config.work_dir.value.clone(),
            output_crs: Crs::from_epsg(config.output_epsg.value),
            output_prefix: config.output_prefix.value.clone(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&LayeredConfig::with_defaults())
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub result: JobResult,

    /// Set when the workspace could not be removed afterwards
    pub cleanup_warning: Option<CleanupWarning>,
}

/// Clip-and-derive pipeline for one job at a time.
///
/// Stages run strictly in sequence and the first failure aborts the rest.
/// The job workspace is removed on every exit path.
pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    observer: Arc<dyn StageObserver>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ObjectStore>, settings: PipelineSettings) -> Self {
        Self { store, observer: Arc::new(TracingObserver), settings }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one job
    pub fn run(&self, request: &JobRequest) -> Result<JobOutcome> {
        tracing::info!("Starting job {}", request.request_id);
        let workspace = JobWorkspace::create(&self.settings.work_dir, &request.request_id)?;

        match self.execute(request, &workspace) {
            Ok(result) => {
                let cleanup_warning = workspace.close();
                let detail = match &cleanup_warning {
                    Some(warning) => warning.to_string(),
                    None => "workspace removed".to_string(),
                };
                self.emit(request, Stage::Cleanup, detail);
                Ok(JobOutcome { result, cleanup_warning })
            }
            Err(e) => {
                tracing::error!("Job {} failed: {}", request.request_id, e);
                // A teardown failure is logged by the workspace and never
                // replaces the job error
                let _ = workspace.close();
                Err(e)
            }
        }
    }

    fn execute(&self, request: &JobRequest, workspace: &JobWorkspace) -> Result<JobResult> {
        // Stage 1: fetch inputs
        fs::write(workspace.boundary_copy(), &request.boundary_source)?;
        self.store.fetch(&request.vector_ref, &workspace.input_archive())?;
        self.store.fetch(&request.raster_ref, &workspace.input_raster())?;

        extract_zip(&workspace.input_archive(), &workspace.extracted_dir())?;
        let shp = find_first_with_extension(&workspace.extracted_dir(), "shp")?;
        let dataset = ShapefileFormat.read(&shp)?;
        self.emit(
            request,
            Stage::Fetch,
            format!("{} feature(s) in {}, raster {}", dataset.len(), dataset.name, request.raster_ref),
        );

        // Stage 2: clip vector, then move it to the output CRS
        let clipped = VectorClipper::new().clip(&request.boundary, &dataset)?;
        let clipped = reproject_dataset(&clipped, &self.settings.output_crs)?;
        self.emit(
            request,
            Stage::ClipVector,
            format!("{} of {} feature(s) kept", clipped.len(), dataset.len()),
        );

        // Stage 3: package vector
        let packaged = VectorPackager::new().package(&clipped, workspace)?;
        self.emit(
            request,
            Stage::PackageVector,
            format!("archive holds {}", packaged.archive_entries.join(", ")),
        );

        // Stage 4: mask raster
        let raster = read_geotiff(&workspace.input_raster())?;
        let clipped_raster = RasterClipper::new().clip(&request.boundary, &raster)?;
        write_geotiff(&clipped_raster, &workspace.clipped_raster())?;
        self.emit(
            request,
            Stage::ClipRaster,
            format!(
                "{}x{} -> {}x{} px",
                raster.width(),
                raster.height(),
                clipped_raster.width(),
                clipped_raster.height()
            ),
        );

        // Stage 5: preview
        let (width, height) = write_preview(&clipped_raster, &workspace.preview())?;
        self.emit(request, Stage::RenderPreview, format!("{}x{} PNG", width, height));

        // Stage 6: geographic bounds of the clipped raster
        let raster_crs = clipped_raster
            .crs()
            .ok_or_else(|| GeoclipError::projection("Clipped raster has no coordinate reference system"))?;
        let bounds = geo_bounds(&clipped_raster.extent(), raster_crs, &self.settings.output_crs)?;
        self.emit(
            request,
            Stage::ComputeBounds,
            format!("N {} S {} E {} W {}", bounds.north, bounds.south, bounds.east, bounds.west),
        );

        // Stage 7: publish
        let publisher = ArtifactPublisher::new(self.store.clone(), self.settings.output_prefix.clone());
        let artifacts = publisher.publish_all(&[
            (ArtifactRole::GeoJson, packaged.geojson_path.clone()),
            (ArtifactRole::Raster, workspace.clipped_raster()),
            (ArtifactRole::Preview, workspace.preview()),
            (ArtifactRole::Archive, packaged.archive_path.clone()),
        ])?;
        self.emit(request, Stage::Publish, format!("{} artifact(s) published", artifacts.len()));

        Ok(JobResult { artifacts, bounds, geojson_result: packaged.geojson_text })
    }

    fn emit(&self, request: &JobRequest, stage: Stage, detail: String) {
        self.observer.stage_completed(&StageEvent::new(request.request_id.clone(), stage, detail));
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("settings", &self.settings).finish_non_exhaustive()
    }
}
