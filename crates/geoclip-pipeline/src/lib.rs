//! GeoClip Pipeline - job orchestration
//!
//! Runs one clip job end to end: fetch inputs into a job workspace, clip
//! and package the vector layer, mask the raster, render its preview,
//! compute its geographic bounds and publish every artifact.

pub mod observer;
pub mod packager;
pub mod pipeline;
pub mod publisher;

pub use observer::TracingObserver;
pub use packager::{PackagedVector, VectorPackager};
pub use pipeline::{JobOutcome, Pipeline, PipelineSettings};
pub use publisher::ArtifactPublisher;
