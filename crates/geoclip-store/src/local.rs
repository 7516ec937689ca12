//! Directory-backed bucket

use std::fs;
use std::path::{Path, PathBuf};

use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::ports::ObjectStore;

use crate::key::validate_key;

/// Object store rooted at a local directory; keys map to relative paths.
///
/// URLs are `<public_base_url>/<key>` when a base URL is configured,
/// otherwise `file://` URLs of the stored objects.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), public_base_url: None }
    }

    pub fn with_public_url(mut self, base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(base_url.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an object is stored at
    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    fn url_for(&self, key: &str, path: &Path) -> Result<String> {
        match &self.public_base_url {
            Some(base) => Ok(format!("{}/{}", base.trim_end_matches('/'), key)),
            None => {
                let absolute = fs::canonicalize(path)?;
                Ok(format!("file://{}", absolute.display()))
            }
        }
    }
}

impl ObjectStore for LocalObjectStore {
    fn fetch(&self, key: &str, dest: &Path) -> Result<()> {
        let source = self.object_path(key)?;
        if !source.is_file() {
            return Err(GeoclipError::not_found(
                "Object",
                format!("'{}' is not in bucket {}", key, self.root.display()),
            ));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = fs::copy(&source, dest)?;

        tracing::debug!("Fetched {} ({} bytes) to {}", key, bytes, dest.display());
        Ok(())
    }

    fn put(&self, local: &Path, key: &str) -> Result<String> {
        let target = self.object_path(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = fs::copy(local, &target)?;

        tracing::debug!("Stored {} ({} bytes) as {}", local.display(), bytes, key);
        self.url_for(key, &target)
    }
}
