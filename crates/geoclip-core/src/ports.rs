//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod events;
pub mod storage;

pub use events::{NoopObserver, Stage, StageEvent, StageObserver};
pub use storage::ObjectStore;
