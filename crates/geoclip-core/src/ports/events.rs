use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Fetch,
    ClipVector,
    PackageVector,
    ClipRaster,
    RenderPreview,
    ComputeBounds,
    Publish,
    Cleanup,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::ClipVector => "clip_vector",
            Stage::PackageVector => "package_vector",
            Stage::ClipRaster => "clip_raster",
            Stage::RenderPreview => "render_preview",
            Stage::ComputeBounds => "compute_bounds",
            Stage::Publish => "publish",
            Stage::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress notification emitted after a stage completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub request_id: String,
    pub stage: Stage,
    /// Short human-readable summary of what the stage produced
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl StageEvent {
    pub fn new(request_id: impl Into<String>, stage: Stage, detail: impl Into<String>) -> Self {
        Self { request_id: request_id.into(), stage, detail: detail.into(), at: Utc::now() }
    }
}

/// Port for stage progress reporting
pub trait StageObserver: Send + Sync {
    fn stage_completed(&self, event: &StageEvent);
}

/// Observer that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn stage_completed(&self, _event: &StageEvent) {}
}
