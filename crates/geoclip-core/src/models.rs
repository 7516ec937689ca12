pub mod dataset;
pub mod geometry;
pub mod job;

pub use dataset::{GeometryCategory, VectorDataset, VectorFeature};
pub use geometry::{BoundingBox, Crs};
pub use job::{ArtifactRole, Boundary, JobRequest, JobResult};
