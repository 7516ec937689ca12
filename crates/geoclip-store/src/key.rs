//! Object key validation

use geoclip_core::error::{GeoclipError, Result};

/// Check that `key` is a relative, `/`-separated path without `.`/`..`
/// or empty segments
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(GeoclipError::input("Object key cannot be empty"));
    }

    if key.starts_with('/') || key.contains('\\') {
        return Err(GeoclipError::input(format!("Object key must be a relative '/' path: {}", key)));
    }

    if key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(GeoclipError::input(format!("Object key has an invalid segment: {}", key)));
    }

    Ok(())
}
