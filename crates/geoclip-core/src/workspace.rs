//! Per-job scratch directory.
//!
//! Every job gets `<work_root>/job_<request_id>`, created non-recursively so
//! two jobs with the same id can never share one directory. All inputs,
//! intermediates and outputs live inside it and the whole tree is removed
//! when the job ends.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{CleanupWarning, GeoclipError, Result};

/// Shapefile component extensions, in archive order
pub const SHAPEFILE_COMPONENTS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

/// Scoped job workspace.
///
/// Release it with [`JobWorkspace::close`] to receive a teardown failure as a
/// value. A workspace dropped without `close` is removed anyway and the
/// failure, if any, is logged.
#[derive(Debug)]
pub struct JobWorkspace {
    request_id: String,
    root: PathBuf,
    released: bool,
}

impl JobWorkspace {
    /// Create the workspace for `request_id` under `work_root`
    pub fn create(work_root: &Path, request_id: &str) -> Result<Self> {
        validate_request_id(request_id)?;

        fs::create_dir_all(work_root)?;
        let root = work_root.join(format!("job_{}", request_id));

        match fs::create_dir(&root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(GeoclipError::Conflict { path: root });
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!("Created workspace {}", root.display());

        Ok(Self { request_id: request_id.to_string(), root, released: false })
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Copy of the request boundary: `<id>.geojson`
    pub fn boundary_copy(&self) -> PathBuf {
        self.file(format!("{}.geojson", self.request_id))
    }

    /// Downloaded vector archive: `<id>_shapefile.zip`
    pub fn input_archive(&self) -> PathBuf {
        self.file(format!("{}_shapefile.zip", self.request_id))
    }

    /// Downloaded raster: `<id>.tif`
    pub fn input_raster(&self) -> PathBuf {
        self.file(format!("{}.tif", self.request_id))
    }

    /// Extraction target for the vector archive
    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join("extracted")
    }

    /// Clipped vector as GeoJSON: `<id>_pci.geojson`
    pub fn clipped_geojson(&self) -> PathBuf {
        self.file(format!("{}_pci.geojson", self.request_id))
    }

    /// Clipped shapefile component: `clipped_<id>.<ext>`
    pub fn clipped_shapefile(&self, extension: &str) -> PathBuf {
        self.file(format!("clipped_{}.{}", self.request_id, extension))
    }

    /// Zipped clipped shapefile: `pci_shape_file_<id>.zip`
    pub fn shapefile_archive(&self) -> PathBuf {
        self.file(format!("pci_shape_file_{}.zip", self.request_id))
    }

    /// Clipped raster: `sri_<id>.tif`
    pub fn clipped_raster(&self) -> PathBuf {
        self.file(format!("sri_{}.tif", self.request_id))
    }

    /// Raster preview: `sri_<id>.png`
    pub fn preview(&self) -> PathBuf {
        self.file(format!("sri_{}.png", self.request_id))
    }

    fn file(&self, name: String) -> PathBuf {
        self.root.join(name)
    }

    /// Remove the workspace and report a teardown failure as a value
    pub fn close(mut self) -> Option<CleanupWarning> {
        self.released = true;
        self.teardown()
    }

    fn teardown(&self) -> Option<CleanupWarning> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                tracing::debug!("Removed workspace {}", self.root.display());
                None
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                let warning = CleanupWarning { path: self.root.clone(), reason: e.to_string() };
                tracing::warn!("{}", warning);
                Some(warning)
            }
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            let _ = self.teardown();
        }
    }
}

/// Request ids become directory names, so only a conservative character set
/// is accepted.
pub fn validate_request_id(request_id: &str) -> Result<()> {
    if request_id.is_empty() {
        return Err(GeoclipError::input("request_id must not be empty"));
    }

    if request_id == "." || request_id == ".." {
        return Err(GeoclipError::input(format!("request_id '{}' is reserved", request_id)));
    }

    if let Some(c) = request_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(GeoclipError::input(format!(
            "request_id '{}' contains unsupported character '{}'",
            request_id, c
        )));
    }

    Ok(())
}
