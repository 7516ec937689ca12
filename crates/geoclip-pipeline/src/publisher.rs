//! Artifact publication to the object store

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::models::ArtifactRole;
use geoclip_core::ports::ObjectStore;

/// Uploads artifacts under `<prefix>/<file name>`.
///
/// Uploads are not retried; the first failure aborts the remaining ones.
pub struct ArtifactPublisher {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ArtifactPublisher {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self { store, prefix: prefix.into() }
    }

    /// Storage key for a local artifact
    pub fn key_for(&self, path: &Path) -> Result<String> {
        let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| GeoclipError::Publish {
            artifact: path.display().to_string(),
            reason: "artifact path has no usable file name".to_string(),
        })?;

        if self.prefix.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{}/{}", self.prefix, name))
        }
    }

    pub fn publish(&self, role: ArtifactRole, path: &Path) -> Result<String> {
        let key = self.key_for(path)?;
        let url = self.store.put(path, &key).map_err(|e| GeoclipError::Publish {
            artifact: format!("{} ({})", role, key),
            reason: e.to_string(),
        })?;

        tracing::info!("Published {} to {}", role, url);
        Ok(url)
    }

    /// Publish every artifact in order, keyed by result key
    pub fn publish_all(&self, artifacts: &[(ArtifactRole, PathBuf)]) -> Result<BTreeMap<String, String>> {
        artifacts
            .iter()
            .map(|(role, path)| Ok((role.result_key().to_string(), self.publish(*role, path)?)))
            .collect()
    }
}

impl std::fmt::Debug for ArtifactPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactPublisher").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}
