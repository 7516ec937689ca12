//! GeoClip Store - object store adapters
//!
//! Implementations of the `ObjectStore` port: a directory-backed bucket
//! for local runs and an in-memory store for tests and dry runs.

pub mod key;
pub mod local;
pub mod memory;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
