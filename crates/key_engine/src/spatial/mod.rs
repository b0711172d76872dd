//! Spatial partitioning

mod octree;

pub use octree::Octree;
