//! GeoClip Core - Domain models, workspace, formats and configuration
//!
//! This crate contains the job model, the error taxonomy, the per-job
//! workspace manager, vector/archive format adapters and the port
//! definitions the pipeline is assembled from.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod ports;
pub mod workspace;

pub use error::{CleanupWarning, GeoclipError, Result};
