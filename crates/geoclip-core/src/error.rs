//! Error types for GeoClip

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoclipError {
    // Request errors
    #[error("Invalid job input: {reason}")]
    Input { reason: String },

    #[error("Workspace already exists at {path}. Request ids must be unique per running job")]
    Conflict { path: PathBuf },

    #[error("{what} not found: {detail}")]
    NotFound { what: String, detail: String },

    // Geospatial errors
    #[error("Projection error: {reason}")]
    Projection { reason: String },

    #[error("Processing error in {stage}: {reason}")]
    Processing { stage: String, reason: String },

    #[error("Format error ({format}): {message}")]
    Format { format: String, message: String },

    // Publication errors
    #[error("Failed to publish {artifact}: {reason}")]
    Publish { artifact: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    Config { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeoclipError {
    pub fn input(reason: impl Into<String>) -> Self {
        Self::Input { reason: reason.into() }
    }

    pub fn projection(reason: impl Into<String>) -> Self {
        Self::Projection { reason: reason.into() }
    }

    pub fn processing(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Processing { stage: stage.into(), reason: reason.into() }
    }

    pub fn format(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format { format: format.into(), message: message.into() }
    }

    pub fn not_found(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NotFound { what: what.into(), detail: detail.into() }
    }
}

impl From<serde_json::Error> for GeoclipError {
    fn from(err: serde_json::Error) -> Self {
        GeoclipError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoclipError>;

/// Non-fatal failure to tear down a job workspace.
///
/// Returned as a value from workspace release so it can be reported next to
/// the job result without ever replacing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to clean up {}: {}", self.path.display(), self.reason)
    }
}
