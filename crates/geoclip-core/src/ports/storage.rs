use std::path::Path;

use crate::error::Result;

/// Port for durable object storage.
///
/// Calls are blocking and never retried by the caller.
pub trait ObjectStore: Send + Sync {
    /// Download the object stored under `key` into `dest`
    fn fetch(&self, key: &str, dest: &Path) -> Result<()>;

    /// Upload the file at `local` under `key` and return its public URL
    fn put(&self, local: &Path, key: &str) -> Result<String>;
}
