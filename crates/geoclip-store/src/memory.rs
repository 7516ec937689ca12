//! In-memory object store for tests and dry runs.
//!
//! A poisoned lock only follows a panic in another thread holding it; the
//! map is still consistent then, so the guard is recovered.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::ports::ObjectStore;

use crate::key::validate_key;

/// Object store holding every object in a shared map
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly
    pub fn insert(&self, key: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        self.objects.write().unwrap_or_else(PoisonError::into_inner).insert(key, bytes);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    /// Stored keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> =
            self.objects.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn fetch(&self, key: &str, dest: &Path) -> Result<()> {
        validate_key(key)?;
        let bytes = self
            .get(key)
            .ok_or_else(|| GeoclipError::not_found("Object", format!("'{}' is not in the memory store", key)))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, bytes)?;
        Ok(())
    }

    fn put(&self, local: &Path, key: &str) -> Result<String> {
        let bytes = fs::read(local)?;
        self.insert(key, bytes)?;
        Ok(format!("memory://{}", key))
    }
}
