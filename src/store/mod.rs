//! Back-ends for [`ArtifactStore`](crate::core::cache::ArtifactStore).

pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;
